use regex::Regex;
use std::sync::LazyLock;

/// Longest identifier the metadata store accepts.
pub const MAX_ID_LENGTH: usize = 128;
/// Longest normalized version the metadata store accepts.
pub const MAX_VERSION_LENGTH: usize = 64;
/// Longest target framework moniker the metadata store accepts.
pub const MAX_TARGET_FRAMEWORK_LENGTH: usize = 256;
/// Longest dependency version range the metadata store accepts.
pub const MAX_VERSION_RANGE_LENGTH: usize = 256;
/// Largest `.nuspec`, decompressed, that an archive may carry.
pub const MAX_MANIFEST_SIZE: u64 = 1024 * 1024;
/// Largest embedded readme or icon, decompressed.
pub const MAX_ASSET_SIZE: u64 = 16 * 1024 * 1024;

/// Package type assumed when a manifest declares none.
pub const DEFAULT_PACKAGE_TYPE: &str = "Dependency";
pub(crate) const DEFAULT_PACKAGE_TYPE_VERSION: &str = "0.0";

const LABEL: &str = r"[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*";

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

regex!(
    VERSION_REGEX,
    format!(r"^(?P<numbers>\d+(?:\.\d+){{0,3}})(?:-(?P<release>{LABEL}))?(?:\+(?P<metadata>{LABEL}))?$").as_str()
);
regex!(PACKAGE_ID_REGEX, r"^\w+(?:[_.-]\w+)*$");
