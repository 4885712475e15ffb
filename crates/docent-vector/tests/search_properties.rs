//! Randomized checks of search ordering and removal alignment.

use docent_vector::{distance::euclidean_distance, FlatIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_vectors(rng: &mut StdRng, count: usize, dims: usize) -> Vec<Vec<f32>> {
    (0..count)
        .map(|_| (0..dims).map(|_| rng.random_range(-1.0f32..1.0)).collect())
        .collect()
}

#[test]
fn search_matches_brute_force_ranking() {
    let mut rng = StdRng::seed_from_u64(7);
    let vectors = random_vectors(&mut rng, 200, 16);
    let mut index = FlatIndex::new(16).unwrap();
    index.add(&vectors).unwrap();

    for query in random_vectors(&mut rng, 10, 16) {
        let hits = index.search(&query, 10).unwrap();
        assert_eq!(hits.len(), 10);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));

        let mut expected: Vec<(usize, f32)> = vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, euclidean_distance(&query, v)))
            .collect();
        expected.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        let expected: Vec<usize> = expected.into_iter().take(10).map(|(i, _)| i).collect();
        let actual: Vec<usize> = hits.iter().map(|h| h.position).collect();
        assert_eq!(actual, expected);
    }
}

#[test]
fn removal_keeps_parallel_list_aligned() {
    let mut rng = StdRng::seed_from_u64(11);
    let vectors = random_vectors(&mut rng, 50, 8);
    let mut owners: Vec<usize> = (0..50).collect();
    let mut index = FlatIndex::new(8).unwrap();
    index.add(&vectors).unwrap();

    let doomed: Vec<usize> = (0..50).filter(|i| i % 3 == 0).collect();
    assert_eq!(index.remove_positions(&doomed), doomed.len());
    owners.retain(|i| i % 3 != 0);

    assert_eq!(index.len(), owners.len());
    for (position, owner) in owners.iter().enumerate() {
        assert_eq!(index.vector(position).unwrap(), vectors[*owner].as_slice());
    }
}
