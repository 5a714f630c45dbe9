//! Reference population and response reshaping
//!
//! Both views keep `_id` and only the relation groups that are present:
//! a missing filiere and empty professeur/element lists are left out of the
//! JSON entirely. References to documents that no longer exist are dropped
//! during population.
//!
//! The list view and the detail view populate differently:
//!
//! | group | list | detail |
//! |---|---|---|
//! | filiere | `{_id, nomFiliere}` | `{nomFiliere}` |
//! | professeurs | raw ids | `[{nom, prenom}]` |
//! | elements | `[{_id, nomElement}]` | `[{nomElement}]` |

use scolaris_common::db::{Element, Filiere, Semestre};
use scolaris_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::references;

/// A semestre reduced to its id and populated relation groups
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemestrePopulate<F, P, E> {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filiere: Option<F>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub professeurs: Vec<P>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<E>,
}

/// Shape returned by `GET /semestres`
pub type SemestreSummary = SemestrePopulate<Filiere, Uuid, Element>;

/// Shape returned by `GET /semestres/:id`
pub type SemestreDetail = SemestrePopulate<FiliereName, ProfesseurName, ElementName>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiliereName {
    #[serde(rename = "nomFiliere")]
    pub nom_filiere: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfesseurName {
    pub nom: String,
    pub prenom: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementName {
    #[serde(rename = "nomElement")]
    pub nom_element: String,
}

async fn populate_filiere(pool: &SqlitePool, semestre: &Semestre) -> Result<Option<Filiere>> {
    match semestre.filiere {
        Some(id) => references::find_filiere(pool, id).await,
        None => Ok(None),
    }
}

async fn populate_elements(pool: &SqlitePool, semestre: &Semestre) -> Result<Vec<Element>> {
    let mut elements = Vec::with_capacity(semestre.elements.len());
    for id in &semestre.elements {
        if let Some(element) = references::find_element(pool, *id).await? {
            elements.push(element);
        }
    }
    Ok(elements)
}

/// List view: filiere and elements populated, professeurs left as ids
pub async fn summarize(pool: &SqlitePool, semestre: &Semestre) -> Result<SemestreSummary> {
    Ok(SemestrePopulate {
        id: semestre.id,
        filiere: populate_filiere(pool, semestre).await?,
        professeurs: semestre.professeurs.clone(),
        elements: populate_elements(pool, semestre).await?,
    })
}

/// Detail view: every group populated and projected to its display fields
pub async fn detail(pool: &SqlitePool, semestre: &Semestre) -> Result<SemestreDetail> {
    let mut professeurs = Vec::with_capacity(semestre.professeurs.len());
    for id in &semestre.professeurs {
        if let Some(prof) = references::find_professeur(pool, *id).await? {
            professeurs.push(ProfesseurName {
                nom: prof.nom,
                prenom: prof.prenom,
            });
        }
    }

    Ok(SemestrePopulate {
        id: semestre.id,
        filiere: populate_filiere(pool, semestre)
            .await?
            .map(|f| FiliereName {
                nom_filiere: f.nom_filiere,
            }),
        professeurs,
        elements: populate_elements(pool, semestre)
            .await?
            .into_iter()
            .map(|e| ElementName {
                nom_element: e.nom_element,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::references::{insert_element, insert_filiere, insert_professeur};
    use scolaris_common::db::{init_memory_database, Professeur};
    use serde_json::json;

    #[tokio::test]
    async fn test_bare_semestre_has_only_id() {
        let pool = init_memory_database().await.unwrap();
        let semestre = Semestre::new("S1");

        let summary = serde_json::to_value(summarize(&pool, &semestre).await.unwrap()).unwrap();
        let detail = serde_json::to_value(detail(&pool, &semestre).await.unwrap()).unwrap();

        assert_eq!(summary, json!({"_id": semestre.id}));
        assert_eq!(detail, json!({"_id": semestre.id}));
    }

    #[tokio::test]
    async fn test_views_differ_in_projection() {
        let pool = init_memory_database().await.unwrap();
        let filiere = Filiere::new("Génie civil");
        let prof = Professeur::new("Lovelace", "Ada");
        let element = Element::new("Topographie");
        insert_filiere(&pool, &filiere).await.unwrap();
        insert_professeur(&pool, &prof).await.unwrap();
        insert_element(&pool, &element).await.unwrap();

        let mut semestre = Semestre::new("S5");
        semestre.filiere = Some(filiere.id);
        semestre.professeurs = vec![prof.id];
        semestre.elements = vec![element.id];

        let summary = serde_json::to_value(summarize(&pool, &semestre).await.unwrap()).unwrap();
        assert_eq!(
            summary,
            json!({
                "_id": semestre.id,
                "filiere": {"_id": filiere.id, "nomFiliere": "Génie civil"},
                "professeurs": [prof.id],
                "elements": [{"_id": element.id, "nomElement": "Topographie"}],
            })
        );

        let detail = serde_json::to_value(detail(&pool, &semestre).await.unwrap()).unwrap();
        assert_eq!(
            detail,
            json!({
                "_id": semestre.id,
                "filiere": {"nomFiliere": "Génie civil"},
                "professeurs": [{"nom": "Lovelace", "prenom": "Ada"}],
                "elements": [{"nomElement": "Topographie"}],
            })
        );
    }

    #[tokio::test]
    async fn test_dangling_references_are_dropped() {
        let pool = init_memory_database().await.unwrap();
        let element = Element::new("Réseaux");
        insert_element(&pool, &element).await.unwrap();

        let mut semestre = Semestre::new("S6");
        semestre.filiere = Some(Uuid::new_v4());
        semestre.professeurs = vec![Uuid::new_v4()];
        semestre.elements = vec![Uuid::new_v4(), element.id];

        let detail = detail(&pool, &semestre).await.unwrap();
        assert!(detail.filiere.is_none());
        assert!(detail.professeurs.is_empty());
        assert_eq!(
            detail.elements,
            vec![ElementName {
                nom_element: "Réseaux".to_string()
            }]
        );
    }
}
