use serde::{Deserialize, Serialize};

/// Identifying fields copied into every exported row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub gender: String,
    pub age: u32,
}

impl Participant {
    pub fn new(id: impl Into<String>, gender: impl Into<String>, age: u32) -> Self {
        Self {
            id: id.into(),
            gender: gender.into(),
            age,
        }
    }
}
