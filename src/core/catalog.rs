//! Static catalogue of cities and consultation topics.

use crate::core::geo::MapCoord;
use crate::service::model::CityIntro;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub name: String,
    pub coords: MapCoord,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTopic {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub sub_topics: Vec<SubTopic>,
}

impl Topic {
    pub fn sub_topic(&self, id: &str) -> Option<&SubTopic> {
        self.sub_topics.iter().find(|sub| sub.id == id)
    }

    /// Topics whose guide is generated with web grounding enabled
    pub fn is_grounded(&self) -> bool {
        self.id == "visa"
    }
}

struct CitySeed {
    id: &'static str,
    name: &'static str,
    x: f64,
    y: f64,
    description: &'static str,
    region: &'static str,
    population: u64,
    image: &'static str,
}

const CITY_SEEDS: &[CitySeed] = &[
    CitySeed { id: "milan", name: "Milano", x: 45.5, y: 15.0, description: "The heart of fashion and finance, with a dynamic student life.", region: "Lombardy", population: 1_400_000, image: "photo-1516336168172-e3093223b2b3" },
    CitySeed { id: "turin", name: "Torino", x: 37.0, y: 15.8, description: "At the foot of the Alps, a centre of the car industry and innovation.", region: "Piedmont", population: 870_000, image: "photo-1555314158-9531a758782f" },
    CitySeed { id: "genoa", name: "Genova", x: 42.0, y: 28.0, description: "Italy's largest port, a lively city rich in maritime history.", region: "Liguria", population: 580_000, image: "photo-1620701779955-c70e307d0f97" },
    CitySeed { id: "venice", name: "Venezia", x: 58.0, y: 13.5, description: "Famous for its canals, a unique experience steeped in art and history.", region: "Veneto", population: 260_000, image: "photo-1523906834658-6e24ef2386f9" },
    CitySeed { id: "padua", name: "Padova", x: 56.0, y: 15.5, description: "Home of one of the oldest universities in the world, where Galileo taught.", region: "Veneto", population: 210_000, image: "photo-1601042599684-2454b574a44f" },
    CitySeed { id: "bologna", name: "Bologna", x: 54.5, y: 26.0, description: "A student city hosting the oldest university in Europe.", region: "Emilia-Romagna", population: 395_000, image: "photo-1590823501178-a0a65c814dc8" },
    CitySeed { id: "pisa", name: "Pisa", x: 49.0, y: 35.0, description: "Known for its leaning tower, a historic city with a deep university tradition.", region: "Tuscany", population: 90_000, image: "photo-1596378440229-a99f19313264" },
    CitySeed { id: "florence", name: "Firenze", x: 54.0, y: 34.0, description: "The cradle of the Renaissance, a paradise for art and architecture lovers.", region: "Tuscany", population: 380_000, image: "photo-1528114498142-4f3542247157" },
    CitySeed { id: "siena", name: "Siena", x: 55.0, y: 38.0, description: "A medieval town famous for the Palio, offering small-scale, high-quality study.", region: "Tuscany", population: 54_000, image: "photo-1589178164346-2c5e55716c5c" },
    CitySeed { id: "perugia", name: "Perugia", x: 58.0, y: 40.0, description: "In green Umbria, known for chocolate and its university for foreigners.", region: "Umbria", population: 165_000, image: "photo-1579294951199-a9a3f787163c" },
    CitySeed { id: "rome", name: "Roma", x: 59.5, y: 46.5, description: "The eternal city, where history meets modern life.", region: "Lazio", population: 2_800_000, image: "photo-1552832230-c0197dd311b5" },
    CitySeed { id: "naples", name: "Napoli", x: 69.0, y: 57.5, description: "The soul of southern Italy, with lively streets and the best pizza.", region: "Campania", population: 960_000, image: "photo-1589923233860-31a83f905a5a" },
    CitySeed { id: "cagliari", name: "Cagliari", x: 44.0, y: 70.0, description: "Capital of Sardinia, where history meets natural beauty.", region: "Sardinia", population: 154_000, image: "photo-1620042186938-f3d320986b24" },
    CitySeed { id: "palermo", name: "Palermo", x: 63.0, y: 82.0, description: "A crossroads of cultures, the warm and colourful face of the Mediterranean.", region: "Sicily", population: 650_000, image: "photo-1582264249213-5006b537c35a" },
];

const TOPIC_SEEDS: &[(&str, &str, [(&str, &str); 3])] = &[
    ("universities", "Universities", [("reputation", "Academic Reputation"), ("social-life", "Campus Life"), ("tuition-fees", "Tuition Fees")]),
    ("accommodation", "Accommodation", [("cost", "Cost"), ("availability", "Availability"), ("dorm-quality", "Dorm Quality")]),
    ("visa", "Visa and Permits", [("ease-of-application", "Ease of Application"), ("processing-time", "Processing Time"), ("part-time-work", "Work Permit")]),
    ("daily-life", "Daily Life", [("cost-of-living", "Cost of Living"), ("public-transport", "Public Transport"), ("student-safety", "Safety")]),
    ("transport", "Getting Around", [("networks", "Transit Networks (Metro, Bus)"), ("student-pass", "Student Passes and Discounts"), ("costs", "Ticket Prices and Outlets")]),
    ("language", "Learning the Language", [("apps-resources", "Apps and Resources"), ("practice-tips", "Practice Tips"), ("basic-phrases", "Basic Phrases")]),
    ("food", "Food", [("affordability", "Affordability"), ("variety", "Variety"), ("student-spots", "Student Spots")]),
];

static SEEDED: Lazy<Catalog> = Lazy::new(|| {
    let cities = CITY_SEEDS
        .iter()
        .map(|seed| City {
            id: seed.id.to_string(),
            name: seed.name.to_string(),
            coords: MapCoord::new(seed.x, seed.y),
            description: seed.description.to_string(),
            region: Some(seed.region.to_string()),
            population: Some(seed.population),
            image_url: format!(
                "https://images.unsplash.com/{}?q=80&w=800&auto=format&fit=crop",
                seed.image
            ),
        })
        .collect();

    let topics = TOPIC_SEEDS
        .iter()
        .map(|(id, name, subs)| Topic {
            id: id.to_string(),
            name: name.to_string(),
            sub_topics: subs
                .iter()
                .map(|(sub_id, sub_name)| SubTopic {
                    id: sub_id.to_string(),
                    name: sub_name.to_string(),
                })
                .collect(),
        })
        .collect();

    Catalog { cities, topics }
});

/// Cities and topics known to the explorer
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    cities: Vec<City>,
    topics: Vec<Topic>,
}

impl Catalog {
    pub fn new(cities: Vec<City>, topics: Vec<Topic>) -> Self {
        Self { cities, topics }
    }

    /// The built-in set of Italian cities and topics
    pub fn seeded() -> Self {
        SEEDED.clone()
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn city(&self, id: &str) -> Option<&City> {
        self.cities.iter().find(|city| city.id == id)
    }

    pub fn topic(&self, id: &str) -> Option<&Topic> {
        self.topics.iter().find(|topic| topic.id == id)
    }

    /// Case-insensitive substring match on city names
    pub fn search(&self, query: &str) -> Vec<&City> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.cities
            .iter()
            .filter(|city| city.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Closest other city by straight-line distance over normalized coordinates.
    /// Ties keep the earlier city in catalogue order.
    pub fn nearest_to(&self, id: &str) -> Option<&City> {
        let origin = self.city(id)?;
        let mut best: Option<(&City, f64)> = None;

        for city in self.cities.iter().filter(|city| city.id != origin.id) {
            let distance = origin.coords.distance_to(&city.coords);
            match best {
                Some((_, min)) if distance >= min => {}
                _ => best = Some((city, distance)),
            }
        }

        best.map(|(city, _)| city)
    }

    /// Overwrites descriptions with refreshed intros; unknown ids and blank
    /// descriptions are ignored. Returns how many cities changed.
    pub fn apply_intros(&mut self, intros: &[CityIntro]) -> usize {
        let mut updated = 0;
        for intro in intros {
            let description = intro.description.trim();
            if description.is_empty() {
                continue;
            }
            if let Some(city) = self.cities.iter_mut().find(|city| city.id == intro.id) {
                if city.description != description {
                    city.description = description.to_string();
                    updated += 1;
                }
            }
        }
        updated
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::seeded()
    }
}
