//! Potts lattice energy model and move bookkeeping.

use potts_wl::lattice::{Lattice, State};
use potts_wl::WlError;
use rand::SeedableRng;
use rand_pcg::Pcg64;

#[test]
fn test_energy_is_idempotent() {
    let mut rng = Pcg64::seed_from_u64(11);
    let lat = Lattice::random(8, 3, &mut rng);
    let e1 = lat.grid_energy(1.0);
    let e2 = lat.grid_energy(1.0);
    assert_eq!(e1.to_bits(), e2.to_bits());
}

#[test]
fn test_apply_then_revert_restores_state() {
    let mut rng = Pcg64::seed_from_u64(12);
    let mut lat = Lattice::random(6, 5, &mut rng);

    for _ in 0..1_000 {
        let before = lat.clone();
        let e_before = lat.grid_energy(1.0);

        let mv = lat.propose_move(5, &mut rng);
        lat.apply(&mv);
        lat.revert(&mv);

        assert_eq!(lat, before);
        assert_eq!(lat.grid_energy(1.0).to_bits(), e_before.to_bits());
    }
}

#[test]
fn test_proposals_stay_in_range() {
    let mut rng = Pcg64::seed_from_u64(13);
    let lat = Lattice::new(5);
    let mut saw_null = false;

    for _ in 0..2_000 {
        let mv = lat.propose_move(3, &mut rng);
        assert!(mv.i < 5 && mv.j < 5);
        assert!((mv.new_state as usize) < 3);
        assert_eq!(mv.old_state, lat.get(mv.i, mv.j));
        saw_null |= mv.is_null();
    }
    // the current state is a legal target
    assert!(saw_null);
}

#[test]
fn test_randomize_covers_all_states() {
    let mut rng = Pcg64::seed_from_u64(14);
    let lat = Lattice::random(20, 8, &mut rng);
    for q in 0..8 {
        assert!(lat.states().contains(&(q as State)), "state {q} never drawn");
    }
    assert!(lat.states().iter().all(|&s| s < 8));
}

#[test]
fn test_energy_stays_in_potts_range() {
    let mut rng = Pcg64::seed_from_u64(15);
    for q in [2, 3, 8] {
        let lat = Lattice::random(7, q, &mut rng);
        let e = lat.grid_energy(1.0);
        assert!((-98.0..=0.0).contains(&e));
        assert_eq!(e.fract(), 0.0);
    }
}

#[test]
fn test_site_energies_sum_to_twice_total() {
    let mut rng = Pcg64::seed_from_u64(16);
    let lat = Lattice::random(5, 2, &mut rng);
    let sum: f64 = (0..5)
        .flat_map(|i| (0..5).map(move |j| (i, j)))
        .map(|(i, j)| lat.site_energy(i, j, 1.0))
        .sum();
    assert_eq!(sum, 2.0 * lat.grid_energy(1.0));
}

#[test]
fn test_random_within_gives_up() {
    let mut rng = Pcg64::seed_from_u64(17);
    // no configuration has positive energy
    let err = Lattice::random_within(4, 2, 1.0, 1.0, 2.0, 25, &mut rng);
    assert!(matches!(err, Err(WlError::InitialLatticeOutOfRange { attempts: 25, .. })));

    let ok = Lattice::random_within(4, 2, 1.0, -32.0, 0.0, 25, &mut rng).unwrap();
    assert_eq!(ok.particles(), 16);
}
