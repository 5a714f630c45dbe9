//! Persisted record models
//!
//! Field names serialize to the wire names used by the HTTP contract
//! (`_id`, `nomSemestre`, `nomFiliere`, ...).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Academic term linking a track, course elements and instructors
///
/// References are weak: the ids are not constrained by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Semestre {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "nomSemestre")]
    pub nom_semestre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filiere: Option<Uuid>,
    /// Ordered course element references
    #[serde(default)]
    pub elements: Vec<Uuid>,
    #[serde(default)]
    pub professeurs: Vec<Uuid>,
    /// Schedule payload, stored as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seances: Option<Value>,
}

impl Semestre {
    /// Create a new semestre with a fresh id and no references
    pub fn new(nom_semestre: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            nom_semestre: nom_semestre.into(),
            filiere: None,
            elements: Vec::new(),
            professeurs: Vec::new(),
            seances: None,
        }
    }
}

/// Academic program/track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filiere {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "nomFiliere")]
    pub nom_filiere: String,
}

impl Filiere {
    pub fn new(nom_filiere: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            nom_filiere: nom_filiere.into(),
        }
    }
}

/// Instructor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Professeur {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub nom: String,
    pub prenom: String,
}

impl Professeur {
    pub fn new(nom: impl Into<String>, prenom: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            nom: nom.into(),
            prenom: prenom.into(),
        }
    }
}

/// Course/module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "nomElement")]
    pub nom_element: String,
}

impl Element {
    pub fn new(nom_element: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            nom_element: nom_element.into(),
        }
    }
}
