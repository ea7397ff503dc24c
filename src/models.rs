//! Catalog entities and the projections returned by the HTTP API.

use crate::entity::{CatalogEntity, ListFilter};
use serde::{Deserialize, Deserializer, Serialize};

/// Film list queries narrow by genre: `genres=[a, b]` → `genre == a AND genre == b`.
const FILM_FILTERS: &[ListFilter] = &[ListFilter {
    param: "genres",
    field: "genre",
}];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Film {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Genre ids this film belongs to. A single-valued keyword field is
    /// stored as a bare string, so both shapes are accepted.
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub genre: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
        None => Vec::new(),
    })
}

impl Film {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Film {
            id: id.into(),
            title: title.into(),
            description: None,
            genre: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genre = genres.into_iter().map(Into::into).collect();
        self
    }
}

impl CatalogEntity for Film {
    fn id(&self) -> &str {
        &self.id
    }

    fn index_name() -> &'static str {
        "movies"
    }

    fn list_filters() -> &'static [ListFilter] {
        FILM_FILTERS
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Genre {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Genre {
            id: id.into(),
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl CatalogEntity for Genre {
    fn id(&self) -> &str {
        &self.id
    }

    fn index_name() -> &'static str {
        "genres"
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub male: Option<String>,
}

impl Person {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Person {
            id: id.into(),
            name: name.into(),
            male: None,
        }
    }
}

impl CatalogEntity for Person {
    fn id(&self) -> &str {
        &self.id
    }

    fn index_name() -> &'static str {
        "persons"
    }
}

// ============================================================================
// API projections
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilmResponse {
    pub id: String,
    pub title: String,
}

impl From<Film> for FilmResponse {
    fn from(film: Film) -> Self {
        FilmResponse {
            id: film.id,
            title: film.title,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenreResponse {
    pub id: String,
    pub title: String,
}

impl From<Genre> for GenreResponse {
    fn from(genre: Genre) -> Self {
        GenreResponse {
            id: genre.id,
            title: genre.title,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonResponse {
    pub id: String,
    pub name: String,
}

impl From<Person> for PersonResponse {
    fn from(person: Person) -> Self {
        PersonResponse {
            id: person.id,
            name: person.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_names() {
        assert_eq!(Film::index_name(), "movies");
        assert_eq!(Genre::index_name(), "genres");
        assert_eq!(Person::index_name(), "persons");
    }

    #[test]
    fn test_only_films_carry_filters() {
        assert_eq!(Film::list_filters().len(), 1);
        assert_eq!(Film::list_filters()[0].param, "genres");
        assert_eq!(Film::list_filters()[0].field, "genre");
        assert!(Genre::list_filters().is_empty());
        assert!(Person::list_filters().is_empty());
    }

    #[test]
    fn test_absent_optional_fields_are_omitted() {
        let bytes = Film::new("f1", "Dune").serialize_for_cache().unwrap();
        assert_eq!(bytes, br#"{"id":"f1","title":"Dune"}"#.to_vec());
    }

    #[test]
    fn test_film_from_search_document() {
        let doc = serde_json::json!({
            "id": "f2",
            "title": "Alien",
            "genre": ["horror", "sci-fi"],
            "imdb_rating": 8.5
        });

        let film = Film::from_document(doc).unwrap();
        assert_eq!(film.genre, vec!["horror", "sci-fi"]);
        assert!(film.description.is_none());
    }

    #[test]
    fn test_single_valued_genre_is_a_list_of_one() {
        let doc = serde_json::json!({"id": "f1", "title": "Dune", "genre": "sci-fi"});

        let film = Film::from_document(doc).unwrap();
        assert_eq!(film.genre, vec!["sci-fi"]);

        // Cached form is always the list shape
        let bytes = film.serialize_for_cache().unwrap();
        assert_eq!(
            bytes,
            br#"{"id":"f1","title":"Dune","genre":["sci-fi"]}"#.to_vec()
        );
    }

    #[test]
    fn test_null_genre_is_empty() {
        let doc = serde_json::json!({"id": "f1", "title": "Dune", "genre": null});
        assert!(Film::from_document(doc).unwrap().genre.is_empty());
    }

    #[test]
    fn test_person_keeps_male_field() {
        let doc = serde_json::json!({"id": "p1", "name": "Ridley Scott", "male": "true"});

        let person = Person::from_document(doc).unwrap();
        assert_eq!(person.male.as_deref(), Some("true"));

        let bytes = person.serialize_for_cache().unwrap();
        assert_eq!(
            bytes,
            br#"{"id":"p1","name":"Ridley Scott","male":"true"}"#.to_vec()
        );
    }

    #[test]
    fn test_response_projection() {
        let film = Film::new("f1", "Dune").with_description("desert planet");
        assert_eq!(
            FilmResponse::from(film),
            FilmResponse {
                id: "f1".into(),
                title: "Dune".into()
            }
        );

        let person = PersonResponse::from(Person::new("p1", "Frank Herbert"));
        assert_eq!(person.name, "Frank Herbert");
    }
}
