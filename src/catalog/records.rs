//! Movie records loaded from the catalog CSV.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{info, instrument};

/// One movie row.
///
/// Every attribute is optional text: the source table stores numbers as text
/// and leaves many cells blank. Blank cells are normalized to `None` at load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Movie {
    pub imdb_title_id: Option<String>,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub year: Option<String>,
    pub date_published: Option<String>,
    pub genre: Option<String>,
    /// Running time in minutes.
    pub duration: Option<String>,
    pub country: Option<String>,
    pub language: Option<String>,
    pub director: Option<String>,
    pub writer: Option<String>,
    pub production_company: Option<String>,
    pub actors: Option<String>,
    pub description: Option<String>,
    pub avg_vote: Option<String>,
    pub votes: Option<String>,
}

fn normalize(field: &mut Option<String>) {
    *field = field
        .take()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
}

impl Movie {
    /// Create a movie with just a title. Mostly useful for fixtures.
    pub fn titled(title: &str) -> Self {
        let mut movie = Self {
            title: Some(title.to_string()),
            ..Default::default()
        };
        movie.normalize();
        movie
    }

    /// Trim every field and turn blank values into `None`.
    pub fn normalize(&mut self) {
        for field in [
            &mut self.imdb_title_id,
            &mut self.title,
            &mut self.original_title,
            &mut self.year,
            &mut self.date_published,
            &mut self.genre,
            &mut self.duration,
            &mut self.country,
            &mut self.language,
            &mut self.director,
            &mut self.writer,
            &mut self.production_company,
            &mut self.actors,
            &mut self.description,
            &mut self.avg_vote,
            &mut self.votes,
        ] {
            normalize(field);
        }
    }

    /// Title for display, falling back to the original title.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.original_title.as_deref())
            .unwrap_or("(untitled)")
    }
}

/// Ordered, read-only collection of movies. A movie is identified by its position.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    movies: Vec<Movie>,
}

impl RecordStore {
    /// Build a store from already-parsed movies, normalizing each one.
    pub fn new(mut movies: Vec<Movie>) -> Self {
        movies.iter_mut().for_each(Movie::normalize);
        Self { movies }
    }

    /// Load the store from a CSV file with a header row.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let store = Self::from_reader(file)?;
        info!("Loaded {} movies", store.len());
        Ok(store)
    }

    /// Parse CSV from any reader. Columns are matched by header name; unknown
    /// columns are ignored and absent ones read as missing values.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut movies = Vec::new();
        for row in csv_reader.deserialize::<Movie>() {
            movies.push(row?);
        }

        Ok(Self::new(movies))
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Get the movie at a position.
    pub fn get(&self, index: usize) -> Option<&Movie> {
        self.movies.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Movie> {
        self.movies.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
imdb_title_id,title,original_title,year,date_published,genre,duration,country,language,director,writer,production_company,actors,description,avg_vote,votes,budget
tt0120815,Saving Private Ryan,Saving Private Ryan,1998,1998-10-30,\"Drama, War\",169,USA,\"English, French\",Steven Spielberg,Robert Rodat,DreamWorks,\"Tom Hanks, Matt Damon\",\"Following the Normandy Landings, a group of soldiers go behind enemy lines.\",8.6,1235804,$70000000
tt0000001,  Untitled Short ,,,,Short,,,,,,,,,,,
";

    #[test]
    fn test_parse_csv_with_quoted_fields() {
        let store = RecordStore::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(store.len(), 2);

        let ryan = store.get(0).unwrap();
        assert_eq!(ryan.title.as_deref(), Some("Saving Private Ryan"));
        assert_eq!(ryan.genre.as_deref(), Some("Drama, War"));
        assert_eq!(ryan.actors.as_deref(), Some("Tom Hanks, Matt Damon"));
        assert_eq!(ryan.votes.as_deref(), Some("1235804"));
    }

    #[test]
    fn test_blank_cells_become_missing() {
        let store = RecordStore::from_reader(SAMPLE.as_bytes()).unwrap();
        let short = store.get(1).unwrap();

        assert_eq!(short.title.as_deref(), Some("Untitled Short"));
        assert!(short.year.is_none());
        assert!(short.description.is_none());
        assert!(short.avg_vote.is_none());
    }

    #[test]
    fn test_missing_columns_are_missing_values() {
        let csv = "title,year\nAlien,1979\n";
        let store = RecordStore::from_reader(csv.as_bytes()).unwrap();
        let alien = store.get(0).unwrap();

        assert_eq!(alien.year.as_deref(), Some("1979"));
        assert!(alien.director.is_none());
        assert!(store.get(1).is_none());
    }

    #[test]
    fn test_display_title_fallback() {
        let mut movie = Movie::default();
        assert_eq!(movie.display_title(), "(untitled)");
        movie.original_title = Some("Le Samouraï".to_string());
        assert_eq!(movie.display_title(), "Le Samouraï");
        assert_eq!(Movie::titled(" Heat ").display_title(), "Heat");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movies.csv");
        std::fs::write(&path, SAMPLE).unwrap();

        let store = RecordStore::load(&path).unwrap();
        assert_eq!(store.iter().count(), 2);
    }
}
