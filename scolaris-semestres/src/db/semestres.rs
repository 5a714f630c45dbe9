//! Semestre persistence

use scolaris_common::db::Semestre;
use scolaris_common::Result;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use super::{parse_uuid, references};

const SELECT_COLUMNS: &str =
    "SELECT id, nom_semestre, filiere_id, elements, professeurs, seances FROM semestres";

/// Field-level update of a semestre
///
/// Absent fields are left untouched. `filiere` and `seances` distinguish an
/// absent key from an explicit `null`, which clears the field. An empty-string
/// `filiere` clears it too, matching create. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SemestrePatch {
    #[serde(rename = "nomSemestre", default)]
    pub nom_semestre: Option<String>,
    #[serde(default, deserialize_with = "present_filiere")]
    pub filiere: Option<Option<Uuid>>,
    #[serde(default)]
    pub elements: Option<Vec<Uuid>>,
    #[serde(default)]
    pub professeurs: Option<Vec<Uuid>>,
    #[serde(default, deserialize_with = "present")]
    pub seances: Option<Option<Value>>,
}

impl SemestrePatch {
    pub fn is_empty(&self) -> bool {
        self.nom_semestre.is_none()
            && self.filiere.is_none()
            && self.elements.is_none()
            && self.professeurs.is_none()
            && self.seances.is_none()
    }
}

/// Marks a key as present, keeping `null` as `Some(None)`
fn present<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Like `present`, with `""` read as `null`
fn present_filiere<'de, D>(deserializer: D) -> std::result::Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.is_empty() => Uuid::parse_str(&raw)
            .map(|id| Some(Some(id)))
            .map_err(serde::de::Error::custom),
        _ => Ok(Some(None)),
    }
}

fn row_to_semestre(row: &SqliteRow) -> Result<Semestre> {
    let id: String = row.get("id");
    let filiere: Option<String> = row.get("filiere_id");
    let elements: String = row.get("elements");
    let professeurs: String = row.get("professeurs");
    let seances: Option<String> = row.get("seances");

    Ok(Semestre {
        id: parse_uuid(&id)?,
        nom_semestre: row.get("nom_semestre"),
        filiere: filiere.as_deref().map(parse_uuid).transpose()?,
        elements: serde_json::from_str(&elements)?,
        professeurs: serde_json::from_str(&professeurs)?,
        seances: seances.as_deref().map(serde_json::from_str).transpose()?,
    })
}

pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Semestre>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_semestre).transpose()
}

pub async fn find_by_name(pool: &SqlitePool, nom_semestre: &str) -> Result<Option<Semestre>> {
    let row = sqlx::query(&format!("{} WHERE nom_semestre = ?", SELECT_COLUMNS))
        .bind(nom_semestre)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_semestre).transpose()
}

/// All semestres in insertion order
pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Semestre>> {
    let rows = sqlx::query(&format!("{} ORDER BY rowid", SELECT_COLUMNS))
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_to_semestre).collect()
}

pub async fn insert(pool: &SqlitePool, semestre: &Semestre) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO semestres (id, nom_semestre, filiere_id, elements, professeurs, seances)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(semestre.id.to_string())
    .bind(&semestre.nom_semestre)
    .bind(semestre.filiere.map(|id| id.to_string()))
    .bind(serde_json::to_string(&semestre.elements)?)
    .bind(serde_json::to_string(&semestre.professeurs)?)
    .bind(semestre.seances.as_ref().map(serde_json::to_string).transpose()?)
    .execute(pool)
    .await?;

    Ok(())
}

/// Apply `patch` and return the post-update record, `None` if `id` is unknown
pub async fn apply_patch(
    pool: &SqlitePool,
    id: Uuid,
    patch: &SemestrePatch,
) -> Result<Option<Semestre>> {
    if patch.is_empty() {
        return find_by_id(pool, id).await;
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("UPDATE semestres SET updated_at = CURRENT_TIMESTAMP");

    if let Some(nom_semestre) = &patch.nom_semestre {
        builder.push(", nom_semestre = ").push_bind(nom_semestre.clone());
    }
    if let Some(filiere) = &patch.filiere {
        builder
            .push(", filiere_id = ")
            .push_bind(filiere.map(|id| id.to_string()));
    }
    if let Some(elements) = &patch.elements {
        builder
            .push(", elements = ")
            .push_bind(serde_json::to_string(elements)?);
    }
    if let Some(professeurs) = &patch.professeurs {
        builder
            .push(", professeurs = ")
            .push_bind(serde_json::to_string(professeurs)?);
    }
    if let Some(seances) = &patch.seances {
        builder
            .push(", seances = ")
            .push_bind(seances.as_ref().map(serde_json::to_string).transpose()?);
    }

    builder.push(" WHERE id = ").push_bind(id.to_string());

    let result = builder.build().execute(pool).await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }

    find_by_id(pool, id).await
}

/// Delete a semestre and pull its id from every back-reference set
///
/// Runs in one transaction. Returns `false` (nothing changed) when `id` is
/// unknown. Any error rolls the whole operation back when the transaction is
/// dropped uncommitted.
pub async fn delete_with_cleanup(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM semestres WHERE id = ?")
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

    if deleted.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    references::pull_semestre(&mut tx, id).await?;

    tx.commit().await?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::references::{insert_element, relink_all, semestres_of, BackRef};
    use scolaris_common::db::{init_memory_database, Element};
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_find() {
        let pool = init_memory_database().await.unwrap();

        let mut semestre = Semestre::new("S1");
        semestre.elements = vec![Uuid::new_v4(), Uuid::new_v4()];
        semestre.seances = Some(json!([{"jour": "lundi", "heure": "08:30"}]));
        insert(&pool, &semestre).await.unwrap();

        let by_id = find_by_id(&pool, semestre.id).await.unwrap().unwrap();
        assert_eq!(by_id, semestre);

        let by_name = find_by_name(&pool, "S1").await.unwrap().unwrap();
        assert_eq!(by_name.id, semestre.id);

        assert!(find_by_name(&pool, "S9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_all_insertion_order() {
        let pool = init_memory_database().await.unwrap();
        for name in ["S2", "S1", "S3"] {
            insert(&pool, &Semestre::new(name)).await.unwrap();
        }

        let names: Vec<String> = find_all(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.nom_semestre)
            .collect();
        assert_eq!(names, vec!["S2", "S1", "S3"]);
    }

    #[tokio::test]
    async fn test_patch_replaces_only_given_fields() {
        let pool = init_memory_database().await.unwrap();
        let mut semestre = Semestre::new("S1");
        semestre.filiere = Some(Uuid::new_v4());
        semestre.seances = Some(json!({"salle": "B12"}));
        insert(&pool, &semestre).await.unwrap();

        let prof = Uuid::new_v4();
        let patch: SemestrePatch =
            serde_json::from_value(json!({"professeurs": [prof], "seances": null, "other": 1}))
                .unwrap();
        let updated = apply_patch(&pool, semestre.id, &patch).await.unwrap().unwrap();

        assert_eq!(updated.nom_semestre, "S1");
        assert_eq!(updated.filiere, semestre.filiere);
        assert_eq!(updated.professeurs, vec![prof]);
        assert!(updated.seances.is_none());
    }

    #[tokio::test]
    async fn test_patch_filiere_null_clears() {
        let pool = init_memory_database().await.unwrap();
        let mut semestre = Semestre::new("S1");
        semestre.filiere = Some(Uuid::new_v4());
        insert(&pool, &semestre).await.unwrap();

        let patch: SemestrePatch = serde_json::from_value(json!({"filiere": null})).unwrap();
        assert_eq!(patch.filiere, Some(None));

        let updated = apply_patch(&pool, semestre.id, &patch).await.unwrap().unwrap();
        assert!(updated.filiere.is_none());
    }

    #[test]
    fn test_patch_filiere_empty_string_is_null() {
        let patch: SemestrePatch = serde_json::from_value(json!({"filiere": ""})).unwrap();
        assert_eq!(patch.filiere, Some(None));

        let id = Uuid::new_v4();
        let patch: SemestrePatch = serde_json::from_value(json!({"filiere": id})).unwrap();
        assert_eq!(patch.filiere, Some(Some(id)));

        let patch: SemestrePatch = serde_json::from_value(json!({})).unwrap();
        assert!(patch.filiere.is_none());

        assert!(serde_json::from_value::<SemestrePatch>(json!({"filiere": "S1"})).is_err());
    }

    #[tokio::test]
    async fn test_patch_unknown_id() {
        let pool = init_memory_database().await.unwrap();

        let patch = SemestrePatch {
            nom_semestre: Some("S4".to_string()),
            ..Default::default()
        };
        assert!(apply_patch(&pool, Uuid::new_v4(), &patch).await.unwrap().is_none());
        assert!(apply_patch(&pool, Uuid::new_v4(), &SemestrePatch::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_patch_duplicate_name_is_unique_violation() {
        let pool = init_memory_database().await.unwrap();
        insert(&pool, &Semestre::new("S1")).await.unwrap();
        let second = Semestre::new("S2");
        insert(&pool, &second).await.unwrap();

        let patch = SemestrePatch {
            nom_semestre: Some("S1".to_string()),
            ..Default::default()
        };
        let err = apply_patch(&pool, second.id, &patch).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_delete_unknown_id_changes_nothing() {
        let pool = init_memory_database().await.unwrap();
        let element = Element::new("Chimie");
        insert_element(&pool, &element).await.unwrap();
        let semestre = Semestre::new("S1");
        insert(&pool, &semestre).await.unwrap();
        relink_all(&pool, semestre.id).await.unwrap();

        assert!(!delete_with_cleanup(&pool, Uuid::new_v4()).await.unwrap());

        assert!(find_by_id(&pool, semestre.id).await.unwrap().is_some());
        assert_eq!(
            semestres_of(&pool, BackRef::Element, element.id).await.unwrap(),
            vec![semestre.id]
        );
    }

    #[tokio::test]
    async fn test_delete_rolls_back_when_cleanup_fails() {
        let pool = init_memory_database().await.unwrap();
        let semestre = Semestre::new("S1");
        insert(&pool, &semestre).await.unwrap();

        // Break the second cleanup statement
        sqlx::query("DROP TABLE element_semestres")
            .execute(&pool)
            .await
            .unwrap();

        assert!(delete_with_cleanup(&pool, semestre.id).await.is_err());

        // The delete itself was rolled back
        assert!(find_by_id(&pool, semestre.id).await.unwrap().is_some());
    }
}
