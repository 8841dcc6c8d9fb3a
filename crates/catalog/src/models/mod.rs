mod children;
mod package;

pub(crate) use self::children::{Children, DependencyRow, FrameworkRow, PackageTypeRow};
pub(crate) use self::package::PackageRow;
