use super::Package;

/// Every stored version of one package id.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageRegistration {
    pub id: String,
    pub packages: Vec<Package>,
}
impl PackageRegistration {
    pub fn new(id: impl Into<String>, packages: Vec<Package>) -> Self {
        Self {
            id: id.into(),
            packages,
        }
    }

    pub fn total_downloads(&self) -> i64 {
        self.packages.iter().map(|package| package.downloads).sum()
    }

    /// Group packages by case-insensitive id, keeping the order in which each
    /// id was first seen. The registration takes the casing of its first package.
    pub fn group(packages: impl IntoIterator<Item = Package>) -> Vec<Self> {
        let mut registrations: Vec<Self> = Vec::new();
        for package in packages {
            let id_lower = package.id.to_lowercase();
            match registrations.iter_mut().find(|r| r.id.to_lowercase() == id_lower) {
                Some(registration) => registration.packages.push(package),
                None => registrations.push(Self::new(package.id.clone(), vec![package])),
            }
        }
        registrations
    }
}
