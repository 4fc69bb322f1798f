//! Fixed classification tables shared by every stage: network groups, fuel
//! categories, carrier classes and the SCC source-category crosswalk.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum CarrierClass {
    #[serde(rename = "Class I")]
    ClassI,
    #[serde(rename = "Class III")]
    ClassIII,
    Passenger,
    Commuter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionSeries {
    Freight,
    Passenger,
}

impl CarrierClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClassI => "Class I",
            Self::ClassIII => "Class III",
            Self::Passenger => "Passenger",
            Self::Commuter => "Commuter",
        }
    }

    pub const fn projection_series(self) -> ProjectionSeries {
        match self {
            Self::ClassI | Self::ClassIII => ProjectionSeries::Freight,
            Self::Passenger | Self::Commuter => ProjectionSeries::Passenger,
        }
    }
}

impl Display for CarrierClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum NetworkGroup {
    Freight,
    Industrial,
    Yard,
    Transit,
    Other,
}

impl NetworkGroup {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "M" | "I" | "S" => Some(Self::Freight),
            "O" => Some(Self::Industrial),
            "Y" => Some(Self::Yard),
            "Z" => Some(Self::Transit),
            "R" | "A" | "X" | "F" | "T" => Some(Self::Other),
            _ => None,
        }
    }

    /// Freight, industrial and yard links carry locomotive fuel; transit and
    /// other links are out of the inventory.
    pub const fn fuel_category(self) -> Option<FuelCategory> {
        match self {
            Self::Freight => Some(FuelCategory::LineHaul),
            Self::Industrial | Self::Yard => Some(FuelCategory::IndustrialYard),
            Self::Transit | Self::Other => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum FuelCategory {
    #[serde(rename = "Fcat")]
    LineHaul,
    #[serde(rename = "IYcat")]
    IndustrialYard,
}

impl FuelCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LineHaul => "Fcat",
            Self::IndustrialYard => "IYcat",
        }
    }
}

impl Display for FuelCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum SourceCategory {
    #[serde(rename = "Line Haul Locomotives: Class I Operations")]
    ClassILineHaul,
    #[serde(rename = "Line Haul Locomotives: Class II / III Operations")]
    ClassIIILineHaul,
    #[serde(rename = "Line Haul Locomotives: Passenger Trains (Amtrak)")]
    PassengerLineHaul,
    #[serde(rename = "Line Haul Locomotives: Commuter Lines")]
    CommuterLineHaul,
    #[serde(rename = "Yard Locomotives")]
    Yard,
}

impl SourceCategory {
    pub const ALL: [SourceCategory; 5] = [
        Self::ClassILineHaul,
        Self::ClassIIILineHaul,
        Self::PassengerLineHaul,
        Self::CommuterLineHaul,
        Self::Yard,
    ];

    pub const fn scc(self) -> u64 {
        match self {
            Self::ClassILineHaul => 2_285_002_006,
            Self::ClassIIILineHaul => 2_285_002_007,
            Self::PassengerLineHaul => 2_285_002_008,
            Self::CommuterLineHaul => 2_285_002_009,
            Self::Yard => 2_285_002_010,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::ClassILineHaul => "Line Haul Locomotives: Class I Operations",
            Self::ClassIIILineHaul => "Line Haul Locomotives: Class II / III Operations",
            Self::PassengerLineHaul => "Line Haul Locomotives: Passenger Trains (Amtrak)",
            Self::CommuterLineHaul => "Line Haul Locomotives: Commuter Lines",
            Self::Yard => "Yard Locomotives",
        }
    }

    pub fn from_scc(scc: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.scc() == scc)
    }

    pub const fn from_crosswalk(
        rr_group: CarrierClass,
        fuel_category: FuelCategory,
    ) -> Option<Self> {
        match (rr_group, fuel_category) {
            (CarrierClass::ClassI, FuelCategory::LineHaul) => Some(Self::ClassILineHaul),
            (CarrierClass::ClassIII, FuelCategory::LineHaul) => Some(Self::ClassIIILineHaul),
            (CarrierClass::Passenger, FuelCategory::LineHaul) => Some(Self::PassengerLineHaul),
            (CarrierClass::Commuter, _) => Some(Self::CommuterLineHaul),
            (CarrierClass::ClassI | CarrierClass::ClassIII, FuelCategory::IndustrialYard) => {
                Some(Self::Yard)
            }
            (CarrierClass::Passenger, FuelCategory::IndustrialYard) => None,
        }
    }

    /// Source categories covered by one carrier label of the EPA rate table.
    pub fn from_epa_label(label: &str) -> &'static [SourceCategory] {
        match label.trim() {
            "large_line_haul" => &[Self::ClassILineHaul],
            "small_rr" => &[Self::ClassIIILineHaul],
            "passenger_commuter" => &[Self::PassengerLineHaul, Self::CommuterLineHaul],
            "large_switch" => &[Self::Yard],
            _ => &[],
        }
    }
}

impl Display for SourceCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).description())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum PollutantType {
    #[serde(rename = "CAP")]
    Cap,
    #[serde(rename = "GHG")]
    Ghg,
    #[serde(rename = "HAP")]
    Hap,
}

#[cfg(test)]
mod tests {
    use super::{CarrierClass, FuelCategory, NetworkGroup, ProjectionSeries, SourceCategory};

    #[test]
    fn network_codes_map_to_fixed_groups() {
        for code in ["M", "I", "S"] {
            assert_eq!(NetworkGroup::from_code(code), Some(NetworkGroup::Freight));
        }
        assert_eq!(NetworkGroup::from_code("O"), Some(NetworkGroup::Industrial));
        assert_eq!(NetworkGroup::from_code("Y"), Some(NetworkGroup::Yard));
        assert_eq!(NetworkGroup::from_code("Z"), Some(NetworkGroup::Transit));
        for code in ["R", "A", "X", "F", "T"] {
            assert_eq!(NetworkGroup::from_code(code), Some(NetworkGroup::Other));
        }
        assert_eq!(NetworkGroup::from_code("Q"), None);
        assert_eq!(NetworkGroup::Transit.fuel_category(), None);
        assert_eq!(
            NetworkGroup::Industrial.fuel_category(),
            Some(FuelCategory::IndustrialYard)
        );
    }

    #[test]
    fn crosswalk_covers_every_inventoried_combination() {
        use CarrierClass::*;
        use FuelCategory::*;

        assert_eq!(
            SourceCategory::from_crosswalk(ClassI, LineHaul),
            Some(SourceCategory::ClassILineHaul)
        );
        assert_eq!(
            SourceCategory::from_crosswalk(ClassIII, IndustrialYard),
            Some(SourceCategory::Yard)
        );
        assert_eq!(
            SourceCategory::from_crosswalk(Commuter, IndustrialYard),
            Some(SourceCategory::CommuterLineHaul)
        );
        assert_eq!(SourceCategory::from_crosswalk(Passenger, IndustrialYard), None);
    }

    #[test]
    fn scc_codes_round_trip_through_lookup() {
        for category in SourceCategory::ALL {
            assert_eq!(SourceCategory::from_scc(category.scc()), Some(category));
        }
        assert_eq!(SourceCategory::from_scc(2_285_002_999), None);
    }

    #[test]
    fn passenger_commuter_label_covers_two_categories() {
        assert_eq!(
            SourceCategory::from_epa_label("passenger_commuter"),
            &[
                SourceCategory::PassengerLineHaul,
                SourceCategory::CommuterLineHaul
            ]
        );
        assert!(SourceCategory::from_epa_label("unknown").is_empty());
        assert_eq!(
            CarrierClass::Commuter.projection_series(),
            ProjectionSeries::Passenger
        );
    }
}
