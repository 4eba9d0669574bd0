//! Provider address record and the formatter that turns it into the cached string
//!
//! Nominatim reports an open-ended set of address keys. Modeling them as one
//! fixed-shape record keeps the fallback chains below exhaustive and checked by the
//! compiler instead of relying on string lookups.

use serde::{Deserialize, Serialize};

/// Separator between formatted address parts
const DELIMITER: &str = ", ";

/// Address details of a reverse geocoding result, one optional field per category
///
/// Unknown keys in the provider payload are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsmAddress {
    pub attraction: Option<String>,
    pub bakery: Option<String>,
    pub borough: Option<String>,
    pub city_block: Option<String>,
    pub city_district: Option<String>,
    pub city: Option<String>,
    pub commercial: Option<String>,
    pub construction: Option<String>,
    pub continent: Option<String>,
    pub country_code: Option<String>,
    pub country: Option<String>,
    pub county: Option<String>,
    pub district: Option<String>,
    pub electronics: Option<String>,
    pub farm: Option<String>,
    pub farmyard: Option<String>,
    pub hamlet: Option<String>,
    pub house_name: Option<String>,
    pub house_number: Option<String>,
    pub industrial: Option<String>,
    pub isolated_dwelling: Option<String>,
    pub municipality: Option<String>,
    pub neighbourhood: Option<String>,
    pub peak: Option<String>,
    pub pedestrian: Option<String>,
    pub postcode: Option<String>,
    pub public_building: Option<String>,
    pub region: Option<String>,
    pub residential: Option<String>,
    pub road: Option<String>,
    pub state: Option<String>,
    pub state_district: Option<String>,
    pub subdivision: Option<String>,
    pub suburb: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
}

/// First present value of a fallback chain
fn first_of<'a>(chain: &[&'a Option<String>]) -> Option<&'a str> {
    chain.iter().copied().find_map(Option::as_deref)
}

impl OsmAddress {
    /// Street name
    pub fn street(&self) -> Option<&str> {
        first_of(&[
            &self.road,
            &self.residential,
            &self.city_block,
            &self.commercial,
            &self.farmyard,
            &self.farm,
            &self.electronics,
            &self.public_building,
            &self.bakery,
            &self.attraction,
        ])
    }

    /// House number or name
    pub fn number(&self) -> Option<&str> {
        first_of(&[&self.house_number, &self.house_name])
    }

    pub fn neighbourhood_name(&self) -> Option<&str> {
        first_of(&[
            &self.suburb,
            &self.neighbourhood,
            &self.borough,
            &self.district,
            &self.subdivision,
            &self.city_district,
        ])
    }

    pub fn city_name(&self) -> Option<&str> {
        first_of(&[
            &self.city,
            &self.town,
            &self.village,
            &self.municipality,
            &self.isolated_dwelling,
            &self.hamlet,
        ])
    }

    pub fn state_name(&self) -> Option<&str> {
        first_of(&[
            &self.state,
            &self.state_district,
            &self.country,
            &self.municipality,
            &self.region,
        ])
    }
}

/// Format an address as `street, number, neighbourhood, city, state, postcode`
///
/// Absent categories are skipped rather than rendered as empty parts.
pub fn format_address(address: &OsmAddress) -> String {
    let parts = [
        address.street(),
        address.number(),
        address.neighbourhood_name(),
        address.city_name(),
        address.state_name(),
        address.postcode.as_deref(),
    ];

    parts.into_iter().flatten().collect::<Vec<_>>().join(DELIMITER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_format_full_address() {
        let address = OsmAddress {
            road: some("Avenida Paulista"),
            house_number: some("1578"),
            suburb: some("Bela Vista"),
            city: some("São Paulo"),
            state: some("São Paulo"),
            postcode: some("01310-200"),
            country: some("Brasil"),
            ..Default::default()
        };

        assert_eq!(
            format_address(&address),
            "Avenida Paulista, 1578, Bela Vista, São Paulo, São Paulo, 01310-200"
        );
    }

    #[test]
    fn test_format_skips_absent_categories() {
        let address = OsmAddress {
            city: some("Porto Alegre"),
            state: some("Rio Grande do Sul"),
            ..Default::default()
        };

        assert_eq!(format_address(&address), "Porto Alegre, Rio Grande do Sul");
    }

    #[test]
    fn test_format_empty_address() {
        assert_eq!(format_address(&OsmAddress::default()), "");
    }

    #[test]
    fn test_fallback_chains() {
        let address = OsmAddress {
            pedestrian: some("ignored"),
            farm: some("Fazenda Boa Vista"),
            house_name: some("Casa Grande"),
            city_district: some("Distrito Sul"),
            hamlet: some("Vila Nova"),
            country: some("Brasil"),
            ..Default::default()
        };

        assert_eq!(address.street(), Some("Fazenda Boa Vista"));
        assert_eq!(address.number(), Some("Casa Grande"));
        assert_eq!(address.neighbourhood_name(), Some("Distrito Sul"));
        assert_eq!(address.city_name(), Some("Vila Nova"));
        assert_eq!(address.state_name(), Some("Brasil"));
    }

    #[test]
    fn test_chain_precedence() {
        let address = OsmAddress {
            road: some("Rua A"),
            residential: some("Rua B"),
            town: some("Town"),
            city: some("City"),
            ..Default::default()
        };

        assert_eq!(address.street(), Some("Rua A"));
        assert_eq!(address.city_name(), Some("City"));
    }

    #[test]
    fn test_deserialize_ignores_unknown_keys() {
        let json = r#"{
            "road": "Rua Augusta",
            "city": "São Paulo",
            "ISO3166-2-lvl4": "BR-SP",
            "country_code": "br"
        }"#;

        let address: OsmAddress = serde_json::from_str(json).unwrap();
        assert_eq!(address.road.as_deref(), Some("Rua Augusta"));
        assert_eq!(address.country_code.as_deref(), Some("br"));
        assert_eq!(format_address(&address), "Rua Augusta, São Paulo");
    }
}
