mod dependency;
mod package;
mod range;
mod registration;
mod version;

pub use self::dependency::{Dependency, PackageType};
pub use self::package::{Package, SemVerLevel};
pub use self::range::VersionRange;
pub use self::registration::PackageRegistration;
pub use self::version::NuGetVersion;
