//! UDP state-mirror bridge: streams [`GameState`] snapshots to an external
//! renderer and applies the state edits it sends back.
//!
//! Every datagram is a one-byte packet tag followed by the body. All
//! multi-byte values are little-endian. The renderer process must be
//! launched separately.

use crate::sim::{Arena, GameState};
use std::{
    io,
    net::{Ipv4Addr, SocketAddr, UdpSocket},
};

/// Port the renderer listens on
pub const RENDERER_PORT: u16 = 45243;
/// Port the engine listens on
pub const ENGINE_PORT: u16 = 34254;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    Quit = 0,
    GameState = 1,
    Connection = 2,
    Paused = 3,
    Speed = 4,
    Render = 5,
}

impl TryFrom<u8> for PacketType {
    type Error = ();
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Quit),
            1 => Ok(Self::GameState),
            2 => Ok(Self::Connection),
            3 => Ok(Self::Paused),
            4 => Ok(Self::Speed),
            5 => Ok(Self::Render),
            _ => Err(()),
        }
    }
}

/// Messages received from the renderer during [`RenderBridge::poll`]
#[derive(Default)]
pub struct ReturnMessages {
    pub game_state: Option<GameState>,
    pub speed: Option<f32>,
    pub paused: Option<bool>,
    pub quit: bool,
}

pub struct RenderBridge {
    socket: UdpSocket,
    renderer_addr: SocketAddr,
    recv_buffer: Vec<u8>,
    paused: bool,
    game_speed: f32,
}

impl RenderBridge {
    /// Bind the engine port and announce ourselves to the renderer
    pub fn new() -> io::Result<Self> {
        Self::new_with_addrs(
            ENGINE_PORT,
            SocketAddr::from((Ipv4Addr::LOCALHOST, RENDERER_PORT)),
        )
    }

    pub fn new_with_addrs(engine_port: u16, renderer_addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, engine_port))?;
        socket.set_nonblocking(true)?;

        let bridge = Self {
            socket,
            renderer_addr,
            recv_buffer: vec![0; 65536],
            paused: false,
            game_speed: 1.0,
        };
        bridge.send_packet(PacketType::Connection, &[])?;

        Ok(bridge)
    }

    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub const fn game_speed(&self) -> f32 {
        self.game_speed
    }

    fn send_packet(&self, packet_type: PacketType, body: &[u8]) -> io::Result<()> {
        let mut datagram = Vec::with_capacity(1 + body.len());
        datagram.push(packet_type as u8);
        datagram.extend_from_slice(body);
        self.socket.send_to(&datagram, self.renderer_addr)?;
        Ok(())
    }

    pub fn send_game_state(&self, game_state: &GameState) -> io::Result<()> {
        self.send_packet(PacketType::GameState, &game_state.to_bytes())
    }

    pub fn send_arena_state(&self, arena: &Arena) -> io::Result<()> {
        self.send_game_state(&GameState::from_arena(arena))
    }

    pub fn send_paused(&mut self, paused: bool) -> io::Result<()> {
        self.send_packet(PacketType::Paused, &[u8::from(paused)])?;
        self.paused = paused;
        Ok(())
    }

    pub fn send_speed(&mut self, speed: f32) -> io::Result<()> {
        self.send_packet(PacketType::Speed, &speed.to_le_bytes())?;
        self.game_speed = speed;
        Ok(())
    }

    /// Drain every pending datagram from the renderer.
    ///
    /// Malformed packets are skipped; the last well-formed value of each
    /// kind wins.
    pub fn poll(&mut self) -> ReturnMessages {
        let mut result = ReturnMessages::default();

        loop {
            let len = match self.socket.recv(&mut self.recv_buffer) {
                Ok(len) => len,
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(_) => break,
            };

            if len == 0 {
                continue;
            }

            let Ok(packet_type) = PacketType::try_from(self.recv_buffer[0]) else {
                continue;
            };
            let body = &self.recv_buffer[1..len];

            match packet_type {
                PacketType::GameState => match GameState::from_bytes(body) {
                    Ok(state) => result.game_state = Some(state),
                    Err(_) => continue,
                },
                PacketType::Speed => {
                    if let Ok(bytes) = <[u8; 4]>::try_from(body) {
                        let speed = f32::from_le_bytes(bytes);
                        result.speed = Some(speed);
                        self.game_speed = speed;
                    }
                }
                PacketType::Paused => {
                    if let Some(&flag) = body.first() {
                        let paused = flag != 0;
                        result.paused = Some(paused);
                        self.paused = paused;
                    }
                }
                PacketType::Quit => result.quit = true,
                PacketType::Connection | PacketType::Render => {}
            }
        }

        result
    }

    /// Apply any state edits the renderer sent back to the arena
    pub fn handle_state_settings(&mut self, arena: &mut Arena) -> ReturnMessages {
        let messages = self.poll();

        if let Some(state) = &messages.game_state {
            arena.set_ball_state(state.ball);
            for car_info in &state.cars {
                let _ = arena.set_car_state(car_info.id, &car_info.state);
            }
            for (idx, pad) in state.pads.iter().enumerate() {
                if idx < arena.boost_pads().len() {
                    arena.set_boost_pad_state(
                        idx,
                        crate::sim::BoostPadState {
                            is_active: pad.is_active,
                            cooldown: pad.cooldown,
                        },
                    );
                }
            }
        }

        messages
    }

    /// Tell the renderer to close, consuming the bridge
    pub fn quit(self) -> io::Result<()> {
        self.send_packet(PacketType::Quit, &[])
    }
}
