use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::HashSet;

use classroom_core::ConfigError;
use classroom_core::model::{ContentCatalog, Difficulty, QuestionId, QuestionItem};

/// Fixed content for one difficulty tier.
///
/// Selection is a pure function of the pool, the caller's used-set, and the
/// injected random source; the pool itself never changes after loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPool {
    difficulty: Difficulty,
    items: Vec<QuestionItem>,
}

impl QuestionPool {
    /// Copy the tier for `difficulty` out of the catalog, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyPool` if the tier is missing or empty.
    pub fn load(catalog: &ContentCatalog, difficulty: Difficulty) -> Result<Self, ConfigError> {
        let items = catalog.items(difficulty)?.to_vec();
        Ok(Self { difficulty, items })
    }

    /// Like [`QuestionPool::load`] with the difficulty given by name.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownDifficulty` for unrecognized names, or
    /// `ConfigError::EmptyPool` as for `load`.
    pub fn load_named(catalog: &ContentCatalog, difficulty: &str) -> Result<Self, ConfigError> {
        Self::load(catalog, difficulty.parse()?)
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn items(&self) -> &[QuestionItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&QuestionItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Pick an item not yet in `used`, uniformly at random.
    ///
    /// When every item has been used the set is cleared before picking, so a
    /// pick always succeeds; for tiny pools this can repeat the item just asked.
    /// The returned set includes the picked id.
    pub fn pick_next<R: Rng + ?Sized>(
        &self,
        used: &HashSet<QuestionId>,
        rng: &mut R,
    ) -> (QuestionItem, HashSet<QuestionId>) {
        let mut used = used.clone();
        let mut candidates: Vec<&QuestionItem> = self
            .items
            .iter()
            .filter(|item| !used.contains(item.id()))
            .collect();

        if candidates.is_empty() {
            log::debug!(
                "all {} {} questions used, starting a fresh cycle",
                self.items.len(),
                self.difficulty
            );
            used.clear();
            candidates = self.items.iter().collect();
        }

        // `load` guarantees at least one item.
        let picked = candidates
            .choose(rng)
            .copied()
            .unwrap_or(&self.items[0])
            .clone();
        used.insert(picked.id().clone());
        (picked, used)
    }

    /// Choose `pair_count` visually distinct items for a memory board.
    ///
    /// Items sharing media (or, without media, the same answer) count once.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotEnoughItemsForPairs` if the tier is too small.
    pub fn deal_pairs<R: Rng + ?Sized>(
        &self,
        pair_count: u32,
        rng: &mut R,
    ) -> Result<Vec<QuestionItem>, ConfigError> {
        let mut seen = HashSet::new();
        let distinct: Vec<&QuestionItem> = self
            .items
            .iter()
            .filter(|item| seen.insert(face_key(item)))
            .collect();

        let wanted = usize::try_from(pair_count).unwrap_or(usize::MAX);
        if distinct.len() < wanted {
            return Err(ConfigError::NotEnoughItemsForPairs {
                difficulty: self.difficulty,
                pairs: pair_count,
                available: distinct.len(),
            });
        }

        Ok(distinct
            .choose_multiple(rng, wanted)
            .map(|item| (*item).clone())
            .collect())
    }
}

fn face_key(item: &QuestionItem) -> String {
    if item.media().is_empty() {
        item.expected_answer().to_lowercase()
    } else {
        item.media().as_str().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classroom_core::model::{QuestionDraft, Topic};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn single_item_catalog() -> ContentCatalog {
        let item = QuestionDraft::new("only", "Closest star?", "Sun")
            .validate()
            .unwrap();
        ContentCatalog::from_tiers(Topic::Planets, [(Difficulty::Easy, vec![item])]).unwrap()
    }

    #[test]
    fn load_matches_configured_sizes() {
        let catalog = ContentCatalog::builtin(Topic::Planets);
        for (difficulty, expected) in [
            (Difficulty::Easy, 4),
            (Difficulty::Normal, 8),
            (Difficulty::Hard, 12),
        ] {
            let pool = QuestionPool::load(&catalog, difficulty).unwrap();
            assert_eq!(pool.len(), expected);
            assert_eq!(pool.items(), catalog.items(difficulty).unwrap());
        }
    }

    #[test]
    fn load_named_rejects_unknown_difficulty() {
        let catalog = ContentCatalog::builtin(Topic::Planets);
        assert_eq!(
            QuestionPool::load_named(&catalog, "extreme").unwrap_err(),
            ConfigError::UnknownDifficulty("extreme".into())
        );
    }

    #[test]
    fn load_empty_tier_fails() {
        let catalog = single_item_catalog();
        assert!(matches!(
            QuestionPool::load(&catalog, Difficulty::Hard),
            Err(ConfigError::EmptyPool { .. })
        ));
    }

    #[test]
    fn never_repeats_until_exhausted() {
        let catalog = ContentCatalog::builtin(Topic::Constellations);
        let pool = QuestionPool::load(&catalog, Difficulty::Normal).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut used = HashSet::new();
        let mut seen = HashSet::new();

        for _ in 0..pool.len() {
            let (item, next) = pool.pick_next(&used, &mut rng);
            assert!(!used.contains(item.id()));
            assert!(seen.insert(item.id().clone()));
            used = next;
        }
        assert_eq!(used.len(), pool.len());
    }

    #[test]
    fn exhaustion_starts_fresh_cycle() {
        let catalog = ContentCatalog::builtin(Topic::Planets);
        let pool = QuestionPool::load(&catalog, Difficulty::Easy).unwrap();
        let all: HashSet<_> = pool.items().iter().map(|i| i.id().clone()).collect();
        let mut rng = StdRng::seed_from_u64(1);

        let (item, next) = pool.pick_next(&all, &mut rng);
        assert_eq!(next.len(), 1);
        assert!(next.contains(item.id()));
    }

    #[test]
    fn single_item_pool_repeats_forever() {
        let pool = QuestionPool::load(&single_item_catalog(), Difficulty::Easy).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut used = HashSet::new();
        for _ in 0..5 {
            let (item, next) = pool.pick_next(&used, &mut rng);
            assert_eq!(item.id().as_str(), "only");
            used = next;
        }
        assert_eq!(used.len(), 1);
    }

    #[test]
    fn deal_pairs_picks_distinct_faces() {
        let catalog = ContentCatalog::builtin(Topic::Planets);
        let pool = QuestionPool::load(&catalog, Difficulty::Hard).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let dealt = pool.deal_pairs(8, &mut rng).unwrap();
        let faces: HashSet<_> = dealt.iter().map(|i| i.media().as_str()).collect();
        assert_eq!(faces.len(), 8);
    }

    #[test]
    fn deal_pairs_needs_enough_items() {
        let catalog = ContentCatalog::builtin(Topic::Planets);
        let pool = QuestionPool::load(&catalog, Difficulty::Easy).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        assert!(matches!(
            pool.deal_pairs(5, &mut rng),
            Err(ConfigError::NotEnoughItemsForPairs { available: 4, .. })
        ));
    }
}
