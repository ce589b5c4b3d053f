//! Static airport and country reference data.
//!
//! Tables are process-wide constants; nothing here is mutated at runtime.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;

use crate::errors::FlightBoardError;

/// Bounding box used to query live state vectors around an airport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub lamin: f64,
    pub lomin: f64,
    pub lamax: f64,
    pub lomax: f64,
}

/// Airport served by the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Airport {
    pub name: &'static str,
    /// IATA-like code, used as the public identifier in queries.
    pub code: &'static str,
    pub icao: &'static str,
    pub country: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Country {
    pub code: &'static str,
    pub name: &'static str,
    /// Member airports as `Airport::code`, in display order.
    pub airports: &'static [&'static str],
}

pub static AIRPORTS: &[Airport] = &[
    Airport {
        name: "Oslo Airport Gardermoen",
        code: "OSL",
        icao: "ENGM",
        country: "Norway",
        lat: 60.1939,
        lon: 11.1004,
        bbox: BoundingBox {
            lamin: 59.9,
            lomin: 10.8,
            lamax: 60.5,
            lomax: 11.4,
        },
    },
    Airport {
        name: "Stockholm Arlanda Airport",
        code: "ARN",
        icao: "ESSA",
        country: "Sweden",
        lat: 59.6519,
        lon: 17.9186,
        bbox: BoundingBox {
            lamin: 59.4,
            lomin: 17.7,
            lamax: 59.9,
            lomax: 18.2,
        },
    },
    Airport {
        name: "Copenhagen Airport",
        code: "CPH",
        icao: "EKCH",
        country: "Denmark",
        lat: 55.6181,
        lon: 12.6561,
        bbox: BoundingBox {
            lamin: 55.4,
            lomin: 12.4,
            lamax: 55.8,
            lomax: 12.9,
        },
    },
    Airport {
        name: "Helsinki-Vantaa Airport",
        code: "HEL",
        icao: "EFHK",
        country: "Finland",
        lat: 60.3172,
        lon: 24.9633,
        bbox: BoundingBox {
            lamin: 60.1,
            lomin: 24.7,
            lamax: 60.5,
            lomax: 25.2,
        },
    },
    Airport {
        name: "Bergen Airport Flesland",
        code: "BGO",
        icao: "ENBR",
        country: "Norway",
        lat: 60.2934,
        lon: 5.2181,
        bbox: BoundingBox {
            lamin: 60.1,
            lomin: 5.0,
            lamax: 60.5,
            lomax: 5.5,
        },
    },
];

pub static COUNTRIES: &[Country] = &[
    Country {
        code: "NO",
        name: "Norway",
        airports: &["OSL", "BGO"],
    },
    Country {
        code: "SE",
        name: "Sweden",
        airports: &["ARN"],
    },
    Country {
        code: "DK",
        name: "Denmark",
        airports: &["CPH"],
    },
    Country {
        code: "FI",
        name: "Finland",
        airports: &["HEL"],
    },
];

/// ICAO code to board display name
pub static AIRPORT_NAMES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    // Nordics
    m.insert("ENGM", "OSLO GARDERMOEN");
    m.insert("ENBR", "BERGEN FLESLAND");
    m.insert("ENZV", "STAVANGER");
    m.insert("ENTC", "TROMSØ");
    m.insert("ENVA", "TRONDHEIM");
    m.insert("ESSA", "STOCKHOLM ARLANDA");
    m.insert("ESGG", "GOTHENBURG");
    m.insert("EKCH", "COPENHAGEN");
    m.insert("EKBI", "BILLUND");
    m.insert("EFHK", "HELSINKI VANTAA");

    // UK & Ireland
    m.insert("EGLL", "LONDON HEATHROW");
    m.insert("EGKK", "LONDON GATWICK");
    m.insert("EGSS", "LONDON STANSTED");
    m.insert("EGGW", "LONDON LUTON");
    m.insert("EGCC", "MANCHESTER");
    m.insert("EIDW", "DUBLIN");

    // Central Europe
    m.insert("EDDF", "FRANKFURT");
    m.insert("EDDM", "MUNICH");
    m.insert("EDDB", "BERLIN BRANDENBURG");
    m.insert("EDDH", "HAMBURG");
    m.insert("EHAM", "AMSTERDAM SCHIPHOL");
    m.insert("EBBR", "BRUSSELS");
    m.insert("LOWW", "VIENNA");
    m.insert("LSZH", "ZURICH");

    // Southern Europe
    m.insert("LFPG", "PARIS CHARLES DE GAULLE");
    m.insert("LFPO", "PARIS ORLY");
    m.insert("LEMD", "MADRID");
    m.insert("LEBL", "BARCELONA");
    m.insert("LIRF", "ROME FIUMICINO");
    m.insert("LIMC", "MILAN MALPENSA");

    // North America
    m.insert("KJFK", "NEW YORK JFK");
    m.insert("KEWR", "NEWARK");
    m.insert("KORD", "CHICAGO O'HARE");
    m.insert("KLAX", "LOS ANGELES");
    m.insert("KSFO", "SAN FRANCISCO");
    m.insert("KATL", "ATLANTA");
    m.insert("KDFW", "DALLAS FORT WORTH");
    m.insert("KDEN", "DENVER");
    m.insert("KLAS", "LAS VEGAS");
    m.insert("KMIA", "MIAMI");
    m.insert("CYYZ", "TORONTO PEARSON");

    // Asia & Middle East
    m.insert("OMDB", "DUBAI");
    m.insert("OTHH", "DOHA");
    m.insert("VHHH", "HONG KONG");
    m.insert("WSSS", "SINGAPORE");
    m.insert("RJTT", "TOKYO HANEDA");
    m.insert("RKSI", "SEOUL INCHEON");
    m.insert("ZBAA", "BEIJING");
    m.insert("ZSPD", "SHANGHAI PUDONG");
    m.insert("VIDP", "DELHI");
    m.insert("VABB", "MUMBAI");

    // Oceania
    m.insert("YSSY", "SYDNEY");
    m.insert("YMML", "MELBOURNE");
    m.insert("NZAA", "AUCKLAND");

    m
});

/// Look up an airport by its public code.
pub fn airport(code: &str) -> Option<&'static Airport> {
    AIRPORTS.iter().find(|a| a.code == code)
}

/// Look up an airport, failing with the set of valid codes.
pub fn require_airport(code: &str) -> Result<&'static Airport, FlightBoardError> {
    airport(code).ok_or_else(|| FlightBoardError::InvalidAirport {
        code: code.to_string(),
        valid_codes: AIRPORTS.iter().map(|a| a.code.to_string()).collect(),
    })
}

pub fn country(code: &str) -> Option<&'static Country> {
    COUNTRIES.iter().find(|c| c.code == code)
}

/// Airports of `country`, or every airport when no country is given.
pub fn airports_in(country_code: Option<&str>) -> Result<Vec<&'static Airport>, FlightBoardError> {
    let Some(code) = country_code else {
        return Ok(AIRPORTS.iter().collect());
    };

    let country = country(code).ok_or_else(|| FlightBoardError::InvalidCountry {
        code: code.to_string(),
        valid_codes: COUNTRIES.iter().map(|c| c.code.to_string()).collect(),
    })?;

    Ok(country
        .airports
        .iter()
        .filter_map(|member| airport(member))
        .collect())
}

/// Resolve an ICAO code to a display name.
///
/// Lookup is case-insensitive. Unknown codes resolve to themselves,
/// uppercased; absent or empty input resolves to `"UNKNOWN"`.
pub fn resolve_airport_name(icao: Option<&str>) -> String {
    match icao {
        None | Some("") => "UNKNOWN".to_string(),
        Some(code) => {
            let upper = code.to_uppercase();
            AIRPORT_NAMES
                .get(upper.as_str())
                .map(|name| name.to_string())
                .unwrap_or(upper)
        }
    }
}
