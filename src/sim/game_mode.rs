#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GameMode {
    #[default]
    Soccar,
    Hoops,
    Heatseeker,
    Snowday,
    Dropshot,
    /// Soccar but without goals, boost pads, or the arena hull.
    /// The cars and ball will fall infinitely.
    TheVoid,
    /// Like `TheVoid` but with a ground plane, for testing purposes
    TheVoidWithGround,
}

impl GameMode {
    pub const ALL: [GameMode; 7] = [
        Self::Soccar,
        Self::Hoops,
        Self::Heatseeker,
        Self::Snowday,
        Self::Dropshot,
        Self::TheVoid,
        Self::TheVoidWithGround,
    ];

    const NAMES: [&'static str; 7] = [
        "soccar",
        "hoops",
        "heatseeker",
        "snowday",
        "dropshot",
        "void",
        "void_with_ground",
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    /// The mode whose arena hull this mode loads.
    /// Returns None for modes with no static meshes at all.
    #[must_use]
    pub const fn mesh_source(self) -> Option<Self> {
        match self {
            Self::Soccar | Self::Heatseeker | Self::Snowday => Some(Self::Soccar),
            Self::Hoops => Some(Self::Hoops),
            Self::Dropshot => Some(Self::Dropshot),
            Self::TheVoid | Self::TheVoidWithGround => None,
        }
    }

    #[must_use]
    pub const fn has_goals(self) -> bool {
        !matches!(self, Self::TheVoid | Self::TheVoidWithGround)
    }

    #[must_use]
    pub const fn has_boost_pads(self) -> bool {
        !matches!(self, Self::TheVoid | Self::TheVoidWithGround | Self::Dropshot)
    }
}

impl TryFrom<u8> for GameMode {
    type Error = ();
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL.get(value as usize).copied().ok_or(())
    }
}
