//! Common test fixtures for snapshot audit tests.
//!
//! Station identities and reference times that show up across the
//! store, unifier and audit test suites.

/// Station codes and names as they appear in upstream exports.
pub mod stations {
    pub const PARIS: (&str, &str) = ("FRPLY", "PARIS (intramuros)");
    pub const LYON: (&str, &str) = ("FRLYS", "LYON (intramuros)");
    pub const MARSEILLE: (&str, &str) = ("FRMSC", "MARSEILLE ST CHARLES");
    pub const BORDEAUX: (&str, &str) = ("FRBOJ", "BORDEAUX ST JEAN");
    pub const LILLE: (&str, &str) = ("FRLLE", "LILLE EUROPE");

    /// Placeholder code for a station not yet identified upstream.
    pub const UNKNOWN_CODE: &str = "XXXXX";

    /// Catalog rows for the stations above: code, name, latitude, longitude.
    pub const CATALOG: &[(&str, &str, f64, f64)] = &[
        ("FRPLY", "Paris", 48.8566, 2.3522),
        ("FRLYS", "Lyon", 45.7640, 4.8357),
        ("FRMSC", "Marseille Saint-Charles", 43.3028, 5.3806),
        ("FRBOJ", "Bordeaux Saint-Jean", 44.8259, -0.5566),
    ];
}

/// Common time values for testing.
pub mod time {
    /// First scrape day used by the fixtures.
    pub const FIRST_SCRAPE_DAY: &str = "2024-05-01";

    /// Hour of day the daily job usually runs.
    pub const SCRAPE_HOUR: u32 = 6;
}

/// Headers of each historical snapshot generation.
pub mod headers {
    /// Earliest exports: auxiliary record columns, `;`-delimited.
    pub const LEGACY: &[&str] = &[
        "datasetid",
        "recordid",
        "record_timestamp",
        "date",
        "train_no",
        "entity",
        "axe",
        "origine_iata",
        "destination_iata",
        "origine",
        "destination",
        "heure_depart",
        "heure_arrivee",
        "od_happy_card",
        "request_date",
    ];

    /// Plain upstream exports with the textual availability flag.
    pub const UPSTREAM: &[&str] = &[
        "date",
        "train_no",
        "entity",
        "axe",
        "origine_iata",
        "destination_iata",
        "origine",
        "destination",
        "heure_depart",
        "heure_arrivee",
        "od_happy_card",
        "request_date",
    ];

    /// Later exports with a boolean flag and times carrying seconds.
    pub const TYPED: &[&str] = &[
        "date",
        "train_no",
        "entity",
        "axe",
        "origine_iata",
        "destination_iata",
        "origine",
        "destination",
        "heure_depart",
        "heure_arrivee",
        "has_seat",
        "request_date",
    ];
}
