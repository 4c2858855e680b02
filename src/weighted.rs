use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

/// Anything that carries a selection weight.
pub trait Weighted {
    /// The relative selection weight.
    fn weight(&self) -> f32;
}

/// Pick one object at random, biased by weight.
///
/// Returns `None` when `objects` is empty or the weights cannot form a
/// distribution (all zero, or any negative).
pub fn weighted_choice<'a, T: Weighted>(
    objects: &[&'a T],
    rng: &mut impl Rng,
) -> Option<&'a T> {
    if objects.is_empty() {
        return None;
    }
    let weights: Vec<f32> = objects.iter().map(|object| object.weight()).collect();
    let dist = WeightedIndex::new(&weights).ok()?;
    Some(objects[dist.sample(rng)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Item(f32);

    impl Weighted for Item {
        fn weight(&self) -> f32 {
            self.0
        }
    }

    #[test]
    fn empty_input_yields_none() {
        let mut rng = StdRng::seed_from_u64(0);
        let objects: Vec<&Item> = Vec::new();
        assert!(weighted_choice(&objects, &mut rng).is_none());
    }

    #[test]
    fn zero_weight_items_are_never_picked() {
        let mut rng = StdRng::seed_from_u64(1);
        let heavy = Item(5.0);
        let never = Item(0.0);
        let objects = vec![&never, &heavy];
        for _ in 0..50 {
            let picked = weighted_choice(&objects, &mut rng).unwrap();
            assert!((picked.weight() - 5.0).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn identical_seeds_pick_identically() {
        let objects_owned: Vec<Item> = (1..=4).map(|w| Item(w as f32)).collect();
        let objects: Vec<&Item> = objects_owned.iter().collect();

        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let pa = weighted_choice(&objects, &mut a).unwrap().weight();
            let pb = weighted_choice(&objects, &mut b).unwrap().weight();
            assert!((pa - pb).abs() < f32::EPSILON);
        }
    }
}
