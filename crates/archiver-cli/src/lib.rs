//! # archiver-cli — Command-Line Interface for the Crawl Archiver
//!
//! Subcommand handlers live in their own modules so integration tests can
//! drive them without spawning the binary.
//!
//! | Subcommand | Module | Effect |
//! |------------|--------|--------|
//! | `run` | [`run`] | fetch a URL, archive body, child links and files, optionally commit |
//! | `verify` | [`inspect`] | re-hash a stored run and its files |
//! | `show` | [`inspect`] | print a stored run as JSON |
//! | `commit` | [`commit`] | perform the completion handshake for a stored run |

pub mod commit;
pub mod inspect;
pub mod run;
