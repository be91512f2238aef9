//! Fixed settings of the test client, with environment overrides.

use std::path::PathBuf;

use crate::broker::LOCAL_DOMAIN;

/// Domain every proxy and stub of the test client binds to.
pub const DOMAIN: &str = LOCAL_DOMAIN;

pub const HU_INSTANCE: &str = "VehicleMediaControl_1";
pub const RSE_INSTANCE: &str = "VehicleMediaControl_2";
pub const CDE_INSTANCE: &str = "VehicleMediaControl_3";

/// The consumer always talks to the head unit instance, whichever
/// instance the provider registers.
pub const CONSUMER_INSTANCE: &str = HU_INSTANCE;

/// Menu option that ends the interactive loop.
pub const EXIT_OPTION: u32 = 999;

pub const DEFAULT_ICON_DUMP_PATH: &str = "/vendor/bin/hw/iconRaw.bin";

/// File that fetched icon bytes are appended to. `VMC_ICON_DUMP_PATH`
/// overrides the default.
pub fn icon_dump_path() -> PathBuf {
    std::env::var("VMC_ICON_DUMP_PATH")
        .ok()
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ICON_DUMP_PATH))
}
