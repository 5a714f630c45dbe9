//! Related collections and their `semestres` back-reference sets
//!
//! The store does not enforce referential integrity between semestres and
//! the Filiere/Professeur/Element back-references. Every mutation site of the
//! controller calls into this module:
//! - update → [`relink_all`] or [`relink_referenced`] (set union)
//! - delete → [`pull_semestre`] inside the delete transaction

use scolaris_common::db::{Element, Filiere, Professeur};
use scolaris_common::Result;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::parse_uuid;

/// A collection whose documents carry a `semestres` back-reference set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackRef {
    Filiere,
    Professeur,
    Element,
}

impl BackRef {
    /// All collections holding back-references, in cleanup order
    pub const ALL: [BackRef; 3] = [BackRef::Professeur, BackRef::Element, BackRef::Filiere];

    fn owner_table(self) -> &'static str {
        match self {
            BackRef::Filiere => "filieres",
            BackRef::Professeur => "professeurs",
            BackRef::Element => "elements",
        }
    }

    fn link_table(self) -> &'static str {
        match self {
            BackRef::Filiere => "filiere_semestres",
            BackRef::Professeur => "professeur_semestres",
            BackRef::Element => "element_semestres",
        }
    }

    fn owner_column(self) -> &'static str {
        match self {
            BackRef::Filiere => "filiere_id",
            BackRef::Professeur => "professeur_id",
            BackRef::Element => "element_id",
        }
    }
}

/// Add `semestre_id` to the back-reference set of every document of every
/// related collection
pub async fn relink_all(pool: &SqlitePool, semestre_id: Uuid) -> Result<()> {
    for kind in BackRef::ALL {
        sqlx::query(&format!(
            "INSERT OR IGNORE INTO {} ({}, semestre_id) SELECT id, ? FROM {}",
            kind.link_table(),
            kind.owner_column(),
            kind.owner_table()
        ))
        .bind(semestre_id.to_string())
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Add `semestre_id` to the back-reference sets of the named documents only
///
/// Ids that resolve to no document are skipped.
pub async fn relink_referenced(
    pool: &SqlitePool,
    semestre_id: Uuid,
    filiere: Option<Uuid>,
    professeurs: &[Uuid],
    elements: &[Uuid],
) -> Result<()> {
    let targets = filiere
        .into_iter()
        .map(|id| (BackRef::Filiere, id))
        .chain(professeurs.iter().map(|id| (BackRef::Professeur, *id)))
        .chain(elements.iter().map(|id| (BackRef::Element, *id)));

    for (kind, owner_id) in targets {
        sqlx::query(&format!(
            "INSERT OR IGNORE INTO {} ({}, semestre_id) SELECT id, ? FROM {} WHERE id = ?",
            kind.link_table(),
            kind.owner_column(),
            kind.owner_table()
        ))
        .bind(semestre_id.to_string())
        .bind(owner_id.to_string())
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Remove `semestre_id` from every back-reference set
///
/// Takes a connection so it can run inside the caller's transaction.
pub async fn pull_semestre(conn: &mut SqliteConnection, semestre_id: Uuid) -> Result<()> {
    for kind in BackRef::ALL {
        sqlx::query(&format!("DELETE FROM {} WHERE semestre_id = ?", kind.link_table()))
            .bind(semestre_id.to_string())
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Back-reference set of one document
pub async fn semestres_of(pool: &SqlitePool, kind: BackRef, owner_id: Uuid) -> Result<Vec<Uuid>> {
    let ids: Vec<String> = sqlx::query_scalar(&format!(
        "SELECT semestre_id FROM {} WHERE {} = ? ORDER BY rowid",
        kind.link_table(),
        kind.owner_column()
    ))
    .bind(owner_id.to_string())
    .fetch_all(pool)
    .await?;

    ids.iter().map(|s| parse_uuid(s)).collect()
}

pub async fn insert_filiere(pool: &SqlitePool, filiere: &Filiere) -> Result<()> {
    sqlx::query("INSERT INTO filieres (id, nom_filiere) VALUES (?, ?)")
        .bind(filiere.id.to_string())
        .bind(&filiere.nom_filiere)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn insert_professeur(pool: &SqlitePool, professeur: &Professeur) -> Result<()> {
    sqlx::query("INSERT INTO professeurs (id, nom, prenom) VALUES (?, ?, ?)")
        .bind(professeur.id.to_string())
        .bind(&professeur.nom)
        .bind(&professeur.prenom)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn insert_element(pool: &SqlitePool, element: &Element) -> Result<()> {
    sqlx::query("INSERT INTO elements (id, nom_element) VALUES (?, ?)")
        .bind(element.id.to_string())
        .bind(&element.nom_element)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn filiere_exists(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    Ok(find_filiere(pool, id).await?.is_some())
}

pub async fn find_filiere(pool: &SqlitePool, id: Uuid) -> Result<Option<Filiere>> {
    let row = sqlx::query("SELECT id, nom_filiere FROM filieres WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let id_str: String = row.get("id");
            Ok(Some(Filiere {
                id: parse_uuid(&id_str)?,
                nom_filiere: row.get("nom_filiere"),
            }))
        }
        None => Ok(None),
    }
}

pub async fn find_professeur(pool: &SqlitePool, id: Uuid) -> Result<Option<Professeur>> {
    let row = sqlx::query("SELECT id, nom, prenom FROM professeurs WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let id_str: String = row.get("id");
            Ok(Some(Professeur {
                id: parse_uuid(&id_str)?,
                nom: row.get("nom"),
                prenom: row.get("prenom"),
            }))
        }
        None => Ok(None),
    }
}

pub async fn find_element(pool: &SqlitePool, id: Uuid) -> Result<Option<Element>> {
    let row = sqlx::query("SELECT id, nom_element FROM elements WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let id_str: String = row.get("id");
            Ok(Some(Element {
                id: parse_uuid(&id_str)?,
                nom_element: row.get("nom_element"),
            }))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scolaris_common::db::init_memory_database;

    #[tokio::test]
    async fn test_relink_all_is_idempotent() {
        let pool = init_memory_database().await.unwrap();
        let filiere = Filiere::new("Informatique");
        let prof = Professeur::new("Curie", "Marie");
        insert_filiere(&pool, &filiere).await.unwrap();
        insert_professeur(&pool, &prof).await.unwrap();

        let semestre_id = Uuid::new_v4();
        relink_all(&pool, semestre_id).await.unwrap();
        relink_all(&pool, semestre_id).await.unwrap();

        assert_eq!(
            semestres_of(&pool, BackRef::Filiere, filiere.id).await.unwrap(),
            vec![semestre_id]
        );
        assert_eq!(
            semestres_of(&pool, BackRef::Professeur, prof.id).await.unwrap(),
            vec![semestre_id]
        );
    }

    #[tokio::test]
    async fn test_relink_referenced_skips_others_and_dangling_ids() {
        let pool = init_memory_database().await.unwrap();
        let named = Element::new("Algèbre");
        let other = Element::new("Analyse");
        insert_element(&pool, &named).await.unwrap();
        insert_element(&pool, &other).await.unwrap();

        let semestre_id = Uuid::new_v4();
        relink_referenced(&pool, semestre_id, Some(Uuid::new_v4()), &[], &[named.id])
            .await
            .unwrap();

        assert_eq!(
            semestres_of(&pool, BackRef::Element, named.id).await.unwrap(),
            vec![semestre_id]
        );
        assert!(semestres_of(&pool, BackRef::Element, other.id)
            .await
            .unwrap()
            .is_empty());

        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM filiere_semestres")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(links, 0);
    }

    #[tokio::test]
    async fn test_pull_semestre_only_removes_that_id() {
        let pool = init_memory_database().await.unwrap();
        let element = Element::new("Physique");
        insert_element(&pool, &element).await.unwrap();

        let kept = Uuid::new_v4();
        let pulled = Uuid::new_v4();
        relink_all(&pool, kept).await.unwrap();
        relink_all(&pool, pulled).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        pull_semestre(&mut conn, pulled).await.unwrap();
        drop(conn);

        assert_eq!(
            semestres_of(&pool, BackRef::Element, element.id).await.unwrap(),
            vec![kept]
        );
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let pool = init_memory_database().await.unwrap();

        assert!(!filiere_exists(&pool, Uuid::new_v4()).await.unwrap());
        assert!(find_professeur(&pool, Uuid::new_v4()).await.unwrap().is_none());
        assert!(find_element(&pool, Uuid::new_v4()).await.unwrap().is_none());
    }
}
