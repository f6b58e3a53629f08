use serde::{Deserialize, Serialize};

/// A repository as returned by the GitHub organization listing.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Repository {
    /// Short name, e.g. `numpy-feedstock`
    pub name: String,
    /// `owner/name`, the identifier stored in the index
    pub full_name: String,
    /// Canonical API URL of the repository
    pub url: String,
}

impl Repository {
    pub fn is_feedstock(&self) -> bool {
        self.name.ends_with("-feedstock")
    }
}
