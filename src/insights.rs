//! Results computed offline from the spatial join of the three registries.
//! They are shown as-is; nothing here is derived from the loaded tables.

pub const PEARSON_TRANSPORT_ECONOMY: f64 = 0.505;
pub const MEI_SHARE_PERCENT: f64 = 62.7;
pub const MEI_TOTAL: usize = 270_788;

pub struct Sector {
    pub name: &'static str,
    pub businesses: usize,
}

pub const LEADING_SECTORS: [Sector; 3] = [
    Sector { name: "Cabeleireiros/Manicure", businesses: 21_976 },
    Sector { name: "Condomínios Prediais", businesses: 21_748 },
    Sector { name: "Promoção de Vendas", businesses: 18_036 },
];

/// Neighborhood buckets by economic density (businesses/km²) and transport
/// density (bus stops/km²), each split at its median.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    WellDeveloped,
    Opportunity,
    Potential,
    Priority,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::WellDeveloped,
        Quadrant::Opportunity,
        Quadrant::Potential,
        Quadrant::Priority,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Quadrant::WellDeveloped => "BEM DESENVOLVIDO",
            Quadrant::Opportunity => "OPORTUNIDADE",
            Quadrant::Potential => "POTENCIAL",
            Quadrant::Priority => "PRIORIDADE",
        }
    }

    pub fn neighborhoods(&self) -> usize {
        match self {
            Quadrant::WellDeveloped | Quadrant::Priority => 96,
            Quadrant::Opportunity | Quadrant::Potential => 64,
        }
    }

    pub fn share_percent(&self) -> u8 {
        match self {
            Quadrant::WellDeveloped | Quadrant::Priority => 30,
            Quadrant::Opportunity | Quadrant::Potential => 20,
        }
    }

    pub fn economy_high(&self) -> bool {
        matches!(self, Quadrant::WellDeveloped | Quadrant::Opportunity)
    }

    pub fn transport_high(&self) -> bool {
        matches!(self, Quadrant::WellDeveloped | Quadrant::Potential)
    }

    pub fn action(&self) -> &'static str {
        match self {
            Quadrant::WellDeveloped => "Manter",
            Quadrant::Opportunity => "INVESTIR!",
            Quadrant::Potential => "Incentivar",
            Quadrant::Priority => "URGENTE!",
        }
    }

    /// Hex color used for the quadrant in maps and cards.
    pub fn color(&self) -> &'static str {
        match self {
            Quadrant::WellDeveloped => "#2ecc71",
            Quadrant::Opportunity => "#f1c40f",
            Quadrant::Potential => "#e67e22",
            Quadrant::Priority => "#e74c3c",
        }
    }
}

pub struct Opportunity {
    pub neighborhood: &'static str,
    pub businesses: usize,
    pub economic_density: u32,
    pub transport_density: u32,
}

const fn opportunity(
    neighborhood: &'static str,
    businesses: usize,
    economic_density: u32,
    transport_density: u32,
) -> Opportunity {
    Opportunity { neighborhood, businesses, economic_density, transport_density }
}

/// Highest-business neighborhoods in the opportunity quadrant.
pub const TOP_OPPORTUNITIES: [Opportunity; 10] = [
    opportunity("Buritis", 6855, 2332, 75),
    opportunity("Castelo", 6653, 2765, 90),
    opportunity("Santa Lúcia", 4281, 1808, 136),
    opportunity("Lindéia", 3995, 1975, 50),
    opportunity("Sagrada Família", 3988, 3087, 135),
    opportunity("Itatiaia", 3881, 2141, 123),
    opportunity("São João Batista", 3468, 1842, 109),
    opportunity("Coqueiros", 3020, 1960, 100),
    opportunity("Jardim Leblon", 2897, 2119, 118),
    opportunity("João Pinheiro", 2814, 1878, 126),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadrants_cover_every_neighborhood() {
        let total: usize = Quadrant::ALL.iter().map(|q| q.neighborhoods()).sum();
        let share: u32 = Quadrant::ALL.iter().map(|q| q.share_percent() as u32).sum();
        assert_eq!(total, 320);
        assert_eq!(share, 100);
    }

    #[test]
    fn quadrant_axes_are_distinct() {
        for (i, a) in Quadrant::ALL.iter().enumerate() {
            for b in &Quadrant::ALL[i + 1..] {
                assert_ne!((a.economy_high(), a.transport_high()), (b.economy_high(), b.transport_high()));
            }
        }
    }

    #[test]
    fn opportunities_are_ranked_by_businesses() {
        assert!(TOP_OPPORTUNITIES.windows(2).all(|w| w[0].businesses >= w[1].businesses));
    }
}
