use env_logger::WriteStyle;
use log::LevelFilter;
use std::io::Write;

pub(crate) fn try_init() -> Result<(), log::SetLoggerError> {
    env_logger::builder()
        .format(|buf, record| writeln!(buf, "[BBALL | {}] {}", record.level(), record.args()))
        .write_style(WriteStyle::Always)
        .filter(None, LevelFilter::Info)
        .try_init()
}
