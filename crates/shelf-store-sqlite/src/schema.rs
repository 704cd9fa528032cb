//! SQL schema for the Shelf SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    username  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS activities (
    activity_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id       INTEGER NOT NULL REFERENCES users(user_id),
    category      TEXT,
    activity_text TEXT NOT NULL,
    created_at    TEXT NOT NULL   -- RFC 3339 UTC, fixed width
);

CREATE TABLE IF NOT EXISTS statuses (
    status_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(user_id),
    status_text TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- One row per liked target. Exactly one of the two target columns is set,
-- and each target has at most one row.
CREATE TABLE IF NOT EXISTS likes (
    like_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    activity_id INTEGER UNIQUE REFERENCES activities(activity_id),
    status_id   INTEGER UNIQUE REFERENCES statuses(status_id),
    CHECK ((activity_id IS NULL) != (status_id IS NULL))
);

-- Membership set; the primary key makes adding a member idempotent.
CREATE TABLE IF NOT EXISTS like_members (
    like_id INTEGER NOT NULL REFERENCES likes(like_id),
    user_id INTEGER NOT NULL REFERENCES users(user_id),
    PRIMARY KEY (like_id, user_id)
);

CREATE TABLE IF NOT EXISTS reviews (
    review_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(user_id),
    book_id     TEXT NOT NULL,   -- catalog work key
    review_text TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    category_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS books (
    book_id TEXT PRIMARY KEY,   -- catalog work key
    title   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS shelves (
    user_id    INTEGER NOT NULL REFERENCES users(user_id),
    book_id    TEXT    NOT NULL REFERENCES books(book_id),
    shelved_at TEXT    NOT NULL,
    PRIMARY KEY (user_id, book_id)
);

-- Categories belong to a shelf entry, not to the book, so two readers can
-- file the same book differently.
CREATE TABLE IF NOT EXISTS shelf_categories (
    user_id     INTEGER NOT NULL,
    book_id     TEXT    NOT NULL,
    category_id INTEGER NOT NULL REFERENCES categories(category_id),
    PRIMARY KEY (user_id, book_id, category_id),
    FOREIGN KEY (user_id, book_id) REFERENCES shelves(user_id, book_id)
);

CREATE TABLE IF NOT EXISTS favourites (
    user_id       INTEGER NOT NULL REFERENCES users(user_id),
    book_id       TEXT    NOT NULL REFERENCES books(book_id),
    favourited_at TEXT    NOT NULL,
    PRIMARY KEY (user_id, book_id)
);

CREATE INDEX IF NOT EXISTS activities_created_idx ON activities(created_at);
CREATE INDEX IF NOT EXISTS statuses_created_idx   ON statuses(created_at);
CREATE INDEX IF NOT EXISTS reviews_created_idx    ON reviews(created_at);

PRAGMA user_version = 2;
";
