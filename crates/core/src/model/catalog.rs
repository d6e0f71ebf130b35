use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::model::difficulty::Difficulty;
use crate::model::question::{QuestionDraft, QuestionItem};

/// Subject area a catalog covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Planets,
    Constellations,
}

impl Topic {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Planets => "planets",
            Topic::Constellations => "constellations",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "planets" | "planet" => Ok(Topic::Planets),
            "constellations" | "constellation" => Ok(Topic::Constellations),
            _ => Err(ConfigError::UnknownTopic(s.to_owned())),
        }
    }
}

/// Fixed backing content for a topic, grouped by difficulty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentCatalog {
    topic: Topic,
    tiers: BTreeMap<Difficulty, Vec<QuestionItem>>,
}

impl ContentCatalog {
    /// Build a catalog from validated tiers.
    ///
    /// Tiers may be left out; loading a missing tier fails later with
    /// `ConfigError::EmptyPool`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::DuplicateQuestionId` if an id repeats within a tier.
    pub fn from_tiers(
        topic: Topic,
        tiers: impl IntoIterator<Item = (Difficulty, Vec<QuestionItem>)>,
    ) -> Result<Self, ConfigError> {
        let mut map = BTreeMap::new();
        for (difficulty, items) in tiers {
            let mut seen = HashSet::with_capacity(items.len());
            for item in &items {
                if !seen.insert(item.id().clone()) {
                    return Err(ConfigError::DuplicateQuestionId {
                        difficulty,
                        id: item.id().to_string(),
                    });
                }
            }
            map.insert(difficulty, items);
        }
        Ok(Self { topic, tiers: map })
    }

    /// The content that ships with the app.
    #[must_use]
    pub fn builtin(topic: Topic) -> Self {
        let (easy, normal, hard) = match topic {
            Topic::Planets => (PLANETS_EASY, PLANETS_NORMAL, PLANETS_HARD),
            Topic::Constellations => (STARS_EASY, STARS_NORMAL, STARS_HARD),
        };
        let tiers = [
            (Difficulty::Easy, builtin_tier(easy)),
            (Difficulty::Normal, builtin_tier(normal)),
            (Difficulty::Hard, builtin_tier(hard)),
        ];
        Self {
            topic,
            tiers: tiers.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Items for a tier, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyPool` if the tier is missing or has no items.
    pub fn items(&self, difficulty: Difficulty) -> Result<&[QuestionItem], ConfigError> {
        match self.tiers.get(&difficulty) {
            Some(items) if !items.is_empty() => Ok(items),
            _ => Err(ConfigError::EmptyPool { difficulty }),
        }
    }

    #[must_use]
    pub fn tier_len(&self, difficulty: Difficulty) -> usize {
        self.tiers.get(&difficulty).map_or(0, Vec::len)
    }
}

type Row = (&'static str, &'static str, &'static str, &'static str);

fn builtin_tier(rows: &[Row]) -> Vec<QuestionItem> {
    rows.iter()
        .filter_map(|(id, prompt, answer, media)| {
            QuestionDraft::new(*id, *prompt, *answer)
                .with_media(*media)
                .validate()
                .ok()
        })
        .collect()
}

const PLANETS_EASY: &[Row] = &[
    ("planet-e1", "Which planet do we live on?", "Earth", "planets/earth.png"),
    ("planet-e2", "Which planet is known as the Red Planet?", "Mars", "planets/mars.png"),
    ("planet-e3", "Which is the largest planet in our solar system?", "Jupiter", "planets/jupiter.png"),
    ("planet-e4", "Which planet is famous for its bright rings?", "Saturn", "planets/saturn.png"),
];

const PLANETS_NORMAL: &[Row] = &[
    ("planet-n1", "Which planet is closest to the Sun?", "Mercury", "planets/mercury.png"),
    ("planet-n2", "Which planet is the hottest?", "Venus", "planets/venus.png"),
    ("planet-n3", "Which planet rotates on its side?", "Uranus", "planets/uranus.png"),
    ("planet-n4", "Which planet is farthest from the Sun?", "Neptune", "planets/neptune.png"),
    ("planet-n5", "Which planet has the Great Red Spot?", "Jupiter", "planets/jupiter.png"),
    ("planet-n6", "Which planet has Olympus Mons?", "Mars", "planets/mars.png"),
    ("planet-n7", "Which planet has one natural moon called the Moon?", "Earth", "planets/earth.png"),
    ("planet-n8", "Which planet could float in a giant bathtub?", "Saturn", "planets/saturn.png"),
];

const PLANETS_HARD: &[Row] = &[
    ("planet-h1", "Which planet has the moon Titan?", "Saturn", "planets/saturn.png"),
    ("planet-h2", "Which planet has the moon Triton?", "Neptune", "planets/neptune.png"),
    ("planet-h3", "Which planet has the moons Phobos and Deimos?", "Mars", "planets/mars.png"),
    ("planet-h4", "Which planet has the moon Europa?", "Jupiter", "planets/jupiter.png"),
    ("planet-h5", "Which planet spins backwards compared to most others?", "Venus", "planets/venus.png"),
    ("planet-h6", "Which planet has the shortest year?", "Mercury", "planets/mercury.png"),
    ("planet-h7", "Which planet was discovered by William Herschel?", "Uranus", "planets/uranus.png"),
    ("planet-h8", "Which planet was found by mathematical prediction?", "Neptune", "planets/neptune.png"),
    ("planet-h9", "Which planet has the strongest winds?", "Neptune", "planets/neptune.png"),
    ("planet-h10", "Which planet has the most volcanoes?", "Venus", "planets/venus.png"),
    ("planet-h11", "Which planet has the moon Miranda?", "Uranus", "planets/uranus.png"),
    ("planet-h12", "Which planet has the densest body in the solar system?", "Earth", "planets/earth.png"),
];

const STARS_EASY: &[Row] = &[
    ("star-e1", "Which constellation is known as the Hunter?", "Orion", "stars/orion.png"),
    ("star-e2", "Which constellation is the Great Bear?", "Ursa Major", "stars/ursa-major.png"),
    ("star-e3", "Which constellation looks like a W in the sky?", "Cassiopeia", "stars/cassiopeia.png"),
    ("star-e4", "Which constellation is the Lion?", "Leo", "stars/leo.png"),
];

const STARS_NORMAL: &[Row] = &[
    ("star-n1", "Which constellation holds the North Star?", "Ursa Minor", "stars/ursa-minor.png"),
    ("star-n2", "Which constellation is the Swan?", "Cygnus", "stars/cygnus.png"),
    ("star-n3", "Which constellation is the Scorpion?", "Scorpius", "stars/scorpius.png"),
    ("star-n4", "Which constellation is the Bull?", "Taurus", "stars/taurus.png"),
    ("star-n5", "Which constellation is the Twins?", "Gemini", "stars/gemini.png"),
    ("star-n6", "Which constellation is the Lyre?", "Lyra", "stars/lyra.png"),
    ("star-n7", "Which constellation is the Southern Cross?", "Crux", "stars/crux.png"),
    ("star-n8", "Which constellation is the Archer?", "Sagittarius", "stars/sagittarius.png"),
];

const STARS_HARD: &[Row] = &[
    ("star-h1", "Which constellation contains the star Betelgeuse?", "Orion", "stars/orion.png"),
    ("star-h2", "Which constellation contains the star Vega?", "Lyra", "stars/lyra.png"),
    ("star-h3", "Which constellation contains the star Deneb?", "Cygnus", "stars/cygnus.png"),
    ("star-h4", "Which constellation contains the star Antares?", "Scorpius", "stars/scorpius.png"),
    ("star-h5", "Which constellation contains the star Aldebaran?", "Taurus", "stars/taurus.png"),
    ("star-h6", "Which constellation contains the star Regulus?", "Leo", "stars/leo.png"),
    ("star-h7", "Which constellation contains the star Altair?", "Aquila", "stars/aquila.png"),
    ("star-h8", "Which constellation contains the star Arcturus?", "Bootes", "stars/bootes.png"),
    ("star-h9", "Which constellation contains the star Spica?", "Virgo", "stars/virgo.png"),
    ("star-h10", "Which constellation contains the star Pollux?", "Gemini", "stars/gemini.png"),
    ("star-h11", "Which constellation is the Winged Horse?", "Pegasus", "stars/pegasus.png"),
    ("star-h12", "Which constellation contains the Andromeda Galaxy?", "Andromeda", "stars/andromeda.png"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tiers_have_configured_sizes() {
        for topic in [Topic::Planets, Topic::Constellations] {
            let catalog = ContentCatalog::builtin(topic);
            assert_eq!(catalog.items(Difficulty::Easy).unwrap().len(), 4);
            assert_eq!(catalog.items(Difficulty::Normal).unwrap().len(), 8);
            assert_eq!(catalog.items(Difficulty::Hard).unwrap().len(), 12);
        }
    }

    #[test]
    fn builtin_ids_are_unique_per_tier() {
        for topic in [Topic::Planets, Topic::Constellations] {
            let catalog = ContentCatalog::builtin(topic);
            for difficulty in Difficulty::ALL {
                let items = catalog.items(difficulty).unwrap().to_vec();
                assert!(ContentCatalog::from_tiers(topic, [(difficulty, items)]).is_ok());
            }
        }
    }

    #[test]
    fn missing_tier_is_empty_pool() {
        let catalog = ContentCatalog::from_tiers(Topic::Planets, []).unwrap();
        assert_eq!(
            catalog.items(Difficulty::Hard).unwrap_err(),
            ConfigError::EmptyPool {
                difficulty: Difficulty::Hard
            }
        );
    }

    #[test]
    fn duplicate_ids_rejected() {
        let item = QuestionDraft::new("x", "q", "a").validate().unwrap();
        let err = ContentCatalog::from_tiers(
            Topic::Planets,
            [(Difficulty::Easy, vec![item.clone(), item])],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateQuestionId { .. }));
    }

    #[test]
    fn topic_parses_singular_and_plural() {
        assert_eq!("Planet".parse::<Topic>().unwrap(), Topic::Planets);
        assert_eq!("constellations".parse::<Topic>().unwrap(), Topic::Constellations);
        assert!("comets".parse::<Topic>().is_err());
    }
}
