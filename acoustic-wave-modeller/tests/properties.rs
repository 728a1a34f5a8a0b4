use acoustic_wave_modeller::{
    run_history, run_snapshot, Grid, NoopObserver, PointSource, Simulation, SimulationParams,
    VelocityModel, WaveError, Wavelet,
};
use ndarray::{Array2, ArrayView2};

fn ricker(nt: usize, dt: f64) -> Vec<f64> {
    Wavelet::ricker(0.25, 4.0).samples(nt, dt)
}

fn simulation(grid: Grid, velocity: VelocityModel, sx: usize, sz: usize, stf: Vec<f64>, dt: f64, nt: usize) -> Simulation {
    Simulation::new(grid, velocity, PointSource::new(sx, sz), stf, SimulationParams::new(dt, nt)).unwrap()
}

fn assert_mirror_symmetric(field: ArrayView2<'_, f64>, step: usize) {
    let (nz, nx) = field.dim();
    for i in 0..nz {
        for j in 0..nx {
            assert_eq!(field[[i, j]], field[[i, nx - 1 - j]], "x mirror at step {step}, ({i}, {j})");
            assert_eq!(field[[i, j]], field[[nz - 1 - i, j]], "z mirror at step {step}, ({i}, {j})");
        }
    }
}

#[test]
fn concrete_five_by_five_scenario() {
    let velocity = vec![1.0; 25];
    let stf = [1.0, 0.0];

    let mut after_one = vec![0.0; 25];
    run_snapshot(&mut after_one, 5, 5, 1.0, 1.0, 2, 0.5, &stf, 2, 2, &velocity).unwrap();
    for (k, &v) in after_one.iter().enumerate() {
        let expected = if k == 2 * 5 + 2 { 1.0 } else { 0.0 };
        assert_eq!(v, expected, "after step 1 at index {k}");
    }

    let mut after_two = vec![0.0; 25];
    let summary = run_snapshot(&mut after_two, 5, 5, 1.0, 1.0, 3, 0.5, &stf, 2, 2, &velocity).unwrap();
    assert_eq!(summary.steps, 2);

    // centre: 2*1 - 0 + 0.25 * (-2 - 2); neighbours: 0.25 * 1
    let mut expected = vec![0.0; 25];
    expected[12] = 1.0;
    for k in [7, 11, 13, 17] {
        expected[k] = 0.25;
    }
    assert_eq!(after_two, expected);
}

#[test]
fn zero_velocity_evolves_by_injection_only() {
    let grid = Grid::new(6, 5, 1.0, 1.0).unwrap();
    let initial = Array2::from_shape_fn(grid.shape(), |(i, j)| (i as f64) - 0.5 * (j as f64));
    let stf: Vec<f64> = (0..8).map(|it| 0.1 * (it + 1) as f64).collect();
    let (sx, sz) = (4, 1);
    let mut sim = simulation(grid, VelocityModel::homogeneous(&grid, 0.0), sx, sz, stf.clone(), 1.0, 9)
        .with_initial_field(initial.view())
        .unwrap();

    let source_index = grid.cell_index(sx, sz);
    while !sim.is_finished() {
        let it = sim.current_timestep();
        let p = sim.wavefield.p.clone();
        let p_old = sim.wavefield.p_old.clone();
        sim.step();

        let p = p.as_slice().unwrap();
        let p_old = p_old.as_slice().unwrap();
        let p_new = sim.pressure();
        let p_new = p_new.as_slice().unwrap();
        for k in 0..grid.len() {
            let mut expected = 2.0 * p[k] - p_old[k];
            if k == source_index {
                expected += stf[it];
            }
            assert_eq!(p_new[k], expected, "step {it}, index {k}");
        }
    }
}

#[test]
fn zero_source_and_initial_condition_stay_zero() {
    let grid = Grid::new(12, 9, 2.0, 1.0).unwrap();
    let velocity = VelocityModel::from_fn(&grid, |i, j| 1.0 + 0.1 * (i + j) as f64);
    let mut sim = simulation(grid, velocity, 3, 3, vec![0.0; 30], 0.2, 31);
    let history = sim.run_history(NoopObserver).unwrap();
    assert_eq!(history.len(), 31);
    assert!(history.frames.iter().all(|&v| v == 0.0));
}

#[test]
fn symmetric_medium_gives_symmetric_field() {
    let grid = Grid::new(11, 9, 1.0, 1.0).unwrap();
    let velocity = VelocityModel::from_fn(&grid, |i, j| {
        1.0 + 0.1 * (j as f64 - 5.0).abs() + 0.05 * (i as f64 - 4.0).abs()
    });
    let (dt, nt) = (0.2, 40);
    let mut sim = simulation(grid, velocity, 5, 4, ricker(nt, dt), dt, nt);
    let history = sim.run_history(NoopObserver).unwrap();

    assert!(history.frames.iter().any(|&v| v != 0.0));
    for it in 0..history.len() {
        assert_mirror_symmetric(history.frame(it), it);
    }
}

#[test]
fn history_last_frame_equals_snapshot() {
    let (nx, nz, nt, dt) = (17, 13, 25, 0.15);
    let grid = Grid::new(nx, nz, 1.0, 1.25).unwrap();
    let velocity: Vec<f64> = (0..grid.len()).map(|k| 1.0 + 0.5 * ((k * 7) % 5) as f64 / 5.0).collect();
    let stf = ricker(nt, dt);

    let mut snapshot = vec![0.0; grid.len()];
    run_snapshot(&mut snapshot, nx, nz, 1.0, 1.25, nt, dt, &stf, 6, 9, &velocity).unwrap();

    let mut history = vec![0.0; nt * grid.len()];
    let summary = run_history(&mut history, nx, nz, 1.0, 1.25, nt, dt, &stf, 6, 9, &velocity).unwrap();
    assert_eq!(summary.steps, nt - 1);

    let last = &history[(nt - 1) * grid.len()..];
    assert_eq!(last, &snapshot[..]);
    assert!(history[..grid.len()].iter().all(|&v| v == 0.0));
}

#[test]
fn history_starts_from_caller_initial_frame() {
    let (nx, nz, nt) = (5, 5, 4);
    let mut initial = vec![0.0; nx * nz];
    initial[12] = 2.0;

    let mut history = vec![0.0; nt * nx * nz];
    history[..nx * nz].copy_from_slice(&initial);
    run_history(&mut history, nx, nz, 1.0, 1.0, nt, 0.3, &[0.0; 3], 0, 0, &vec![1.0; 25]).unwrap();

    let mut snapshot = initial.clone();
    run_snapshot(&mut snapshot, nx, nz, 1.0, 1.0, nt, 0.3, &[0.0; 3], 0, 0, &vec![1.0; 25]).unwrap();

    assert_eq!(&history[..nx * nz], &initial[..]);
    assert_eq!(&history[3 * nx * nz..], &snapshot[..]);
}

#[test]
fn one_step_only_reaches_stencil_neighbours() {
    let grid = Grid::new(9, 9, 1.0, 1.0).unwrap();
    let (sx, sz) = (3, 5);
    let mut stf = vec![0.0; 4];
    stf[0] = 1.0;
    let mut sim = simulation(grid, VelocityModel::homogeneous(&grid, 1.0), sx, sz, stf, 0.5, 5);

    for step in 1..=3 {
        sim.step();
        let field = sim.pressure();
        for i in 0..grid.nz {
            for j in 0..grid.nx {
                let distance = i.abs_diff(sz) + j.abs_diff(sx);
                if distance >= step {
                    assert_eq!(field[[i, j]], 0.0, "step {step}, ({i}, {j})");
                }
            }
        }
    }
    // two steps after injection the neighbours have been reached
    assert!(sim.pressure()[[sz, sx + 1]] != 0.0);
}

#[test]
fn serial_and_parallel_runs_are_identical() {
    let grid = Grid::new(40, 30, 1.0, 1.0).unwrap();
    let velocity = VelocityModel::layered(&grid, 1.0, &[(15, 1.5)]);
    let (dt, nt) = (0.3, 60);

    let mut serial = Simulation::new(
        grid,
        velocity.clone(),
        PointSource::new(20, 10),
        ricker(nt, dt),
        SimulationParams::new(dt, nt).with_parallel(false),
    )
    .unwrap();
    let mut parallel = Simulation::new(
        grid,
        velocity,
        PointSource::new(20, 10),
        ricker(nt, dt),
        SimulationParams::new(dt, nt).with_parallel(true),
    )
    .unwrap();

    serial.run(NoopObserver);
    parallel.run(NoopObserver);
    assert_eq!(serial.pressure(), parallel.pressure());
}

#[test]
fn invalid_inputs_are_reported() {
    let c = vec![1.0; 25];
    let stf = [0.0; 4];
    let mut p = vec![0.0; 25];

    assert!(matches!(
        run_snapshot(&mut p[..10], 2, 5, 1.0, 1.0, 5, 0.1, &stf, 0, 0, &c[..10]),
        Err(WaveError::InvalidGrid { nx: 2, nz: 5, .. })
    ));
    assert_eq!(
        run_snapshot(&mut p, 5, 5, -1.0, 1.0, 5, 0.1, &stf, 0, 0, &c),
        Err(WaveError::InvalidSpacing { name: "dx", value: -1.0 })
    );
    assert_eq!(
        run_snapshot(&mut p, 5, 5, 1.0, 1.0, 5, 0.0, &stf, 0, 0, &c),
        Err(WaveError::InvalidSpacing { name: "dt", value: 0.0 })
    );
    assert_eq!(
        run_snapshot(&mut p, 5, 5, 1.0, 1.0, 5, 0.1, &stf, 5, 0, &c),
        Err(WaveError::SourceOutOfBounds { sx: 5, sz: 0, nx: 5, nz: 5 })
    );
    assert_eq!(
        run_snapshot(&mut p, 5, 5, 1.0, 1.0, 6, 0.1, &stf, 1, 1, &c),
        Err(WaveError::InsufficientSourceSamples { required: 5, provided: 4 })
    );
    assert_eq!(
        run_snapshot(&mut p, 5, 5, 1.0, 1.0, 5, 0.1, &stf, 1, 1, &c[..24]),
        Err(WaveError::FieldShapeMismatch { field: "velocity", expected: 25, found: 24 })
    );
    assert_eq!(
        run_history(&mut p, 5, 5, 1.0, 1.0, 5, 0.1, &stf, 1, 1, &c),
        Err(WaveError::FieldShapeMismatch { field: "history", expected: 125, found: 25 })
    );
    // nothing was written on failure
    assert!(p.iter().all(|&v| v == 0.0));
}
