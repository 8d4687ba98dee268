//! The batches shipped with the binaries, one per binary.

pub const AVATARS: &str = include_str!("../catalogs/avatars.ron");
pub const AVATARS_CREATIVE: &str = include_str!("../catalogs/avatars_creative.ron");
pub const AVATARS_SUPERCELL: &str = include_str!("../catalogs/avatars_supercell.ron");

pub const ALL: [&str; 3] = [AVATARS, AVATARS_CREATIVE, AVATARS_SUPERCELL];
