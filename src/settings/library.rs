// LibriSync - Audible Library Sync for Mobile
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Saved library operations
//!
//! The library is one JSON array under `user_library_books`. Every mutation
//! reads the whole list, edits it and writes it back; lists are expected to
//! stay small. Mutations through one `SettingsStore` are serialized, so the
//! one-entry-per-`marketId` invariant holds for concurrent callers sharing it.
//!
//! Add, update and remove report whether they changed anything. The no-op
//! cases are not errors and leave the backend untouched.

use super::keys::LIBRARY_BOOKS_KEY;
use super::models::{LibraryBook, MarketId};
use super::SettingsStore;
use crate::error::{PrefsError, Result};
use crate::storage::KeyValueStore;

impl<S: KeyValueStore> SettingsStore<S> {
    /// All saved books in insertion order; empty if nothing was ever saved
    pub fn get_library_books(&self) -> Result<Vec<LibraryBook>> {
        self.load_library()
    }

    /// Append `book` unless an entry with the same `market_id` exists
    ///
    /// Returns `false` (and leaves the existing entry untouched) when the id
    /// is already present.
    pub fn add_book_to_library(&self, book: LibraryBook) -> Result<bool> {
        let _guard = self.lock_library()?;
        let mut books = self.load_library()?;

        if books.iter().any(|b| b.market_id == book.market_id) {
            log::debug!("Book {} already in library", book.market_id);
            return Ok(false);
        }

        log::debug!("Adding book {} to library", book.market_id);
        books.push(book);
        self.store_library(&books)?;
        Ok(true)
    }

    /// Drop every entry with `market_id`; returns `false` if none matched
    pub fn remove_book_from_library(&self, market_id: impl Into<MarketId>) -> Result<bool> {
        let market_id = market_id.into();
        let _guard = self.lock_library()?;
        let mut books = self.load_library()?;

        let before = books.len();
        books.retain(|b| b.market_id != market_id);
        if books.len() == before {
            return Ok(false);
        }

        log::debug!("Removed book {} from library", market_id);
        self.store_library(&books)?;
        Ok(true)
    }

    /// Replace the entry with the same `market_id`, keeping its position
    ///
    /// Returns `false` when no such entry exists; `book` is then discarded,
    /// not appended.
    pub fn update_book_in_library(&self, book: LibraryBook) -> Result<bool> {
        let _guard = self.lock_library()?;
        let mut books = self.load_library()?;

        let Some(slot) = books.iter_mut().find(|b| b.market_id == book.market_id) else {
            log::debug!("Book {} not in library, update skipped", book.market_id);
            return Ok(false);
        };

        log::debug!("Updating book {} in library", book.market_id);
        *slot = book;
        self.store_library(&books)?;
        Ok(true)
    }

    pub fn is_book_in_library(&self, market_id: impl Into<MarketId>) -> Result<bool> {
        let market_id = market_id.into();
        Ok(self
            .load_library()?
            .iter()
            .any(|b| b.market_id == market_id))
    }

    /// Load the list, treating a missing key as empty
    ///
    /// A present value that does not decode is an error, so a damaged list is
    /// never overwritten by the next mutation.
    fn load_library(&self) -> Result<Vec<LibraryBook>> {
        match self.storage.get(LIBRARY_BOOKS_KEY)? {
            None => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value)
                .map_err(|e| PrefsError::invalid_data(LIBRARY_BOOKS_KEY, e.to_string())),
        }
    }

    fn store_library(&self, books: &[LibraryBook]) -> Result<()> {
        self.storage
            .set(LIBRARY_BOOKS_KEY, serde_json::to_value(books)?)
    }
}
