use phyem_lib::simulation::model::{heat_gain, next_temperature, HeatingParams, InductionModel};
use phyem_lib::simulation::{Material, SimulationHandle};
use phyem_lib::metrics::Metrics;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

#[test]
fn test_worked_example() {
    let mut model = InductionModel::default();
    model.set_turns(120);
    model.set_current(15);
    let t = model.step();
    assert!((t - 25.48114).abs() < 1e-9);
}

#[test]
fn test_insulator_only_decays() {
    let params = HeatingParams::default();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let turns: f64 = rng.gen_range(0.0..5_000.0);
        let current: f64 = rng.gen_range(0.0..500.0);
        assert_eq!(heat_gain(Material::Glass, turns, current, &params), 0.0);
    }

    let mut t = 180.0;
    for _ in 0..3_000 {
        let next = next_temperature(t, 0.0, &params);
        assert!(next < t || (t - params.ambient).abs() < 1e-9);
        t = next;
    }
    assert!(t >= params.ambient && t - params.ambient < 1e-6);
}

#[test]
fn test_never_exceeds_max_temperature() {
    let params = HeatingParams::default();
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..50 {
        let turns: f64 = rng.gen_range(0.0..1e6);
        let current: f64 = rng.gen_range(0.0..1e6);
        let gain = heat_gain(Material::Iron, turns, current, &params);
        let mut t = params.ambient;
        for _ in 0..300 {
            t = next_temperature(t, gain, &params);
            assert!(t <= params.max_temperature);
        }
    }
}

#[test]
fn test_zero_drive_decays_monotonically() {
    let params = HeatingParams::default();
    for (turns, current) in [(0.0, 40.0), (300.0, 0.0)] {
        let gain = heat_gain(Material::Iron, turns, current, &params);
        assert_eq!(gain, 0.0);
        let mut t = 120.0;
        for _ in 0..500 {
            let next = next_temperature(t, gain, &params);
            assert!(next <= t);
            t = next;
        }
    }
}

#[test]
fn test_iron_heats_faster_than_stainless() {
    let mut iron = InductionModel::default();
    let mut steel = InductionModel::default();
    steel.set_material(Material::Stainless, 0.0);
    for _ in 0..120 {
        iron.step();
        steel.step();
    }
    assert!(iron.temperature() > steel.temperature());
    assert!(steel.temperature() > 25.0);
}

#[tokio::test(start_paused = true)]
async fn test_frame_loop_publishes_and_applies_inputs() {
    let metrics = Metrics::new();
    let sim = SimulationHandle::spawn(HeatingParams::default(), 60, metrics.clone());
    let mut frames = sim.subscribe();

    for _ in 0..10 {
        frames.changed().await.unwrap();
    }
    let warm = sim.latest();
    assert!(warm.frame >= 10);
    assert!(warm.model.temperature > 25.0);

    assert!(sim.set_material(Material::Glass));
    frames.changed().await.unwrap();
    let placed = sim.latest();
    assert_eq!(placed.model.material, Material::Glass);
    assert!(placed.model.placing);
    assert!(placed.visuals.eddy_rings.is_empty());

    assert!(metrics.snapshot().frames_simulated >= 11);
    drop(sim);
}
