// SPDX-License-Identifier: GPL-3.0-or-later

//! Tag access for the fields resolution needs: artist, title and the release date.

use std::path::Path;

use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::read_from_path;
use lofty::tag::{Accessor, ItemKey, Tag, TagType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TagError {
    #[error("failed to read tags from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: lofty::error::LoftyError,
    },

    #[error("failed to write tags to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: lofty::error::LoftyError,
    },

    #[error("no tag container available for {0}")]
    NoTag(String),
}

/// Tag fields read before resolution. Missing text fields read as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSnapshot {
    pub artist: String,
    pub title: String,
    pub year: Option<i32>,
}

pub trait TagAccessor: Send + Sync {
    fn read(&self, path: &Path) -> Result<TagSnapshot, TagError>;

    /// Persist `year` as the release date of the file.
    fn write_year(&self, path: &Path, year: i32) -> Result<(), TagError>;
}

const DATE_KEYS: [ItemKey; 4] = [
    ItemKey::Year,
    ItemKey::RecordingDate,
    ItemKey::ReleaseDate,
    ItemKey::OriginalReleaseDate,
];

/// Tag accessor backed by `lofty`.
#[derive(Debug, Default, Clone)]
pub struct LoftyTagAccessor;

impl TagAccessor for LoftyTagAccessor {
    fn read(&self, path: &Path) -> Result<TagSnapshot, TagError> {
        let tagged_file = read_from_path(path).map_err(|source| TagError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
            return Ok(TagSnapshot::default());
        };

        Ok(snapshot_from_tag(tag))
    }

    fn write_year(&self, path: &Path, year: i32) -> Result<(), TagError> {
        let mut tagged_file = read_from_path(path).map_err(|source| TagError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let mut tag_type = tagged_file.primary_tag_type();
        if tagged_file.tag(tag_type).is_none() {
            if let Some(tag) = tagged_file.first_tag() {
                tag_type = tag.tag_type();
            } else {
                tag_type = default_tag_type(path);
            }
        }

        if tagged_file.tag(tag_type).is_none() {
            tagged_file.insert_tag(Tag::new(tag_type));
        }
        let tag = tagged_file
            .tag_mut(tag_type)
            .ok_or_else(|| TagError::NoTag(path.display().to_string()))?;

        tag.insert_text(ItemKey::RecordingDate, year.to_string());

        tagged_file
            .save_to_path(path, WriteOptions::default())
            .map_err(|source| TagError::Write {
                path: path.display().to_string(),
                source,
            })
    }
}

fn snapshot_from_tag(tag: &Tag) -> TagSnapshot {
    let year = tag
        .year()
        .and_then(|year| i32::try_from(year).ok())
        .filter(|year| *year > 0)
        .or_else(|| {
            DATE_KEYS
                .iter()
                .find_map(|key| tag.get_string(key).and_then(year_prefix))
        });

    TagSnapshot {
        artist: tag.artist().map(|s| s.trim().to_string()).unwrap_or_default(),
        title: tag.title().map(|s| s.trim().to_string()).unwrap_or_default(),
        year,
    }
}

/// Leading four-digit year of a tag date value such as `1999`, `1999-11-05` or `1999-11-05T10:00`.
fn year_prefix(value: &str) -> Option<i32> {
    let value = value.trim();
    let digits = value.get(..4)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if value[4..].starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i32>().ok().filter(|year| *year > 0)
}

fn default_tag_type(path: &Path) -> TagType {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "flac" | "ogg" | "oga" | "opus" => TagType::VorbisComments,
        "mp4" | "m4a" | "m4b" | "aac" => TagType::Mp4Ilst,
        _ => TagType::Id3v2,
    }
}
