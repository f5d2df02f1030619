//! Planetary positions from the JPL "Keplerian Elements for Approximate Positions of the
//! Major Planets" table (valid 1800 AD - 2050 AD).
//!
//! Elements are propagated linearly in Julian centuries past J2000 and evaluated as a
//! heliocentric two-body orbit in the ecliptic J2000 frame.

use log::trace;
use snoopy_core::constants::{AU_M, DAYS_PER_JULIAN_CENTURY, DEG2RAD, MU_SUN_M3_S2};
use snoopy_core::time::Epoch;

use crate::{Ephemeris, EphemerisError, KeplerianElements, StateVector};

const VALIDITY: &str = "1800-01-01 to 2050-01-01";
const MIN_MJD2000: f64 = -73_048.0;
const MAX_MJD2000: f64 = 18_263.0;

/// One row of the table: a (AU), e, I, L, long. peri., long. node (deg) and their
/// rates per Julian century.
#[derive(Debug, Clone, Copy)]
struct PlanetRow {
    name: &'static str,
    elements: [f64; 6],
    rates: [f64; 6],
}

const PLANETS: [PlanetRow; 9] = [
    PlanetRow {
        name: "mercury",
        elements: [0.38709927, 0.20563593, 7.00497902, 252.25032350, 77.45779628, 48.33076593],
        rates: [0.00000037, 0.00001906, -0.00594749, 149472.67411175, 0.16047689, -0.12534081],
    },
    PlanetRow {
        name: "venus",
        elements: [0.72333566, 0.00677672, 3.39467605, 181.97909950, 131.60246718, 76.67984255],
        rates: [0.00000390, -0.00004107, -0.00078890, 58517.81538729, 0.00268329, -0.27769418],
    },
    PlanetRow {
        name: "earth",
        elements: [1.00000261, 0.01671123, -0.00001531, 100.46457166, 102.93768193, 0.0],
        rates: [0.00000562, -0.00004392, -0.01294668, 35999.37244981, 0.32327364, 0.0],
    },
    PlanetRow {
        name: "mars",
        elements: [1.52371034, 0.09339410, 1.84969142, -4.55343205, -23.94362959, 49.55953891],
        rates: [0.00001847, 0.00007882, -0.00813131, 19140.30268499, 0.44441088, -0.29257343],
    },
    PlanetRow {
        name: "jupiter",
        elements: [5.20288700, 0.04838624, 1.30439695, 34.39644051, 14.72847983, 100.47390909],
        rates: [-0.00011607, -0.00013253, -0.00183714, 3034.74612775, 0.21252668, 0.20469106],
    },
    PlanetRow {
        name: "saturn",
        elements: [9.53667594, 0.05386179, 2.48599187, 49.95424423, 92.59887831, 113.66242448],
        rates: [-0.00125060, -0.00050991, 0.00193609, 1222.49362201, -0.41897216, -0.28867794],
    },
    PlanetRow {
        name: "uranus",
        elements: [19.18916464, 0.04725744, 0.77263783, 313.23810451, 170.95427630, 74.01692503],
        rates: [-0.00196176, -0.00004397, -0.00242939, 428.48202785, 0.40805281, 0.04240589],
    },
    PlanetRow {
        name: "neptune",
        elements: [30.06992276, 0.00859048, 1.77004347, -55.12002969, 44.96476227, 131.78422574],
        rates: [0.00026291, 0.00005105, 0.00035372, 218.45945325, -0.32241464, -0.00508664],
    },
    PlanetRow {
        name: "pluto",
        elements: [39.48211675, 0.24882730, 17.14001206, 238.92903833, 224.06891629, 110.30393684],
        rates: [-0.00031596, 0.00005170, 0.00004818, 145.20780515, -0.04062942, -0.01183482],
    },
];

/// Low-precision analytic ephemeris for one of the nine classical planets.
#[derive(Debug, Clone)]
pub struct JplLowPrecision {
    row: PlanetRow,
}

impl JplLowPrecision {
    /// Look a planet up by case-insensitive name (`"earth"` means the Earth-Moon barycenter).
    pub fn new(name: &str) -> Result<Self, EphemerisError> {
        let lower = name.trim().to_ascii_lowercase();
        PLANETS
            .iter()
            .find(|row| row.name == lower)
            .map(|row| Self { row: *row })
            .ok_or_else(|| EphemerisError::UnknownBody(name.to_string()))
    }

    pub fn earth() -> Self {
        Self { row: PLANETS[2] }
    }

    /// Names accepted by [`JplLowPrecision::new`].
    pub fn supported_bodies() -> impl Iterator<Item = &'static str> {
        PLANETS.iter().map(|row| row.name)
    }

    /// Mean elements at `epoch`, converted from the table's longitudes.
    pub fn elements_at(&self, epoch: Epoch) -> Result<KeplerianElements, EphemerisError> {
        let mjd2000 = epoch.mjd2000();
        if mjd2000 <= MIN_MJD2000 || mjd2000 >= MAX_MJD2000 {
            return Err(EphemerisError::OutOfRange {
                body: self.row.name.to_string(),
                epoch,
                valid: VALIDITY,
            });
        }

        // The table is referenced to J2000 (noon), MJD2000 counts from midnight.
        let centuries = (mjd2000 - 0.5) / DAYS_PER_JULIAN_CENTURY;
        let mut el = [0.0; 6];
        for (k, value) in el.iter_mut().enumerate() {
            *value = self.row.elements[k] + self.row.rates[k] * centuries;
        }
        el[0] *= AU_M;
        for value in el.iter_mut().skip(2) {
            *value *= DEG2RAD;
        }

        let [a, e, i, mean_longitude, long_peri, long_node] = el;
        Ok(KeplerianElements {
            a_m: a,
            e,
            i_rad: i,
            raan_rad: long_node,
            argp_rad: long_peri - long_node,
            mean_anomaly_rad: mean_longitude - long_peri,
        })
    }
}

impl Ephemeris for JplLowPrecision {
    fn name(&self) -> &str {
        self.row.name
    }

    fn mu_central_m3_s2(&self) -> f64 {
        MU_SUN_M3_S2
    }

    fn state_at(&self, epoch: Epoch) -> Result<StateVector, EphemerisError> {
        let elements = self.elements_at(epoch)?;
        trace!("{} at {epoch}: {elements:?}", self.row.name);
        elements.to_state_vector(MU_SUN_M3_S2)
    }
}
