//! Integration tests for tress-solver.

use glam::{Mat3, Vec3};
use tress_math::block::outer;
use tress_math::{long_vector, BlockSparseMatrix};
use tress_solver::cg::{self, CgSettings};
use tress_solver::config::{HairVolumeParams, LinearSolverKind, SolverConfig, SpringParams};
use tress_solver::constraint::ConstraintSet;
use tress_solver::forces::{self, Face};
use tress_solver::frame::{FrameMapping, RootFrame, RootTransform, WorldFrame};
use tress_solver::grid::{self, ColliderPoint, GridChannel, InteractionGrid};
use tress_solver::projected;
use tress_solver::spring::{self, GoalTarget, Spring, SpringContext, SpringKind};
use tress_solver::ImplicitSolver;
use tress_telemetry::{EventBus, EventKind, VecSink};
use tress_types::TressError;

fn approx(a: Vec3, b: Vec3, tol: f32) -> bool {
    (a - b).length() < tol
}

// ─── Config Tests ─────────────────────────────────────────────

#[test]
fn config_defaults_are_valid() {
    let config = SolverConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.cg_max_iterations, 100);
    assert!((config.cg_tolerance - 0.01).abs() < 1e-9);
    assert_eq!(config.grid_resolution, 10);
    assert_eq!(config.linear_solver, LinearSolverKind::ConjugateGradient);
    assert!(!config.hair_volume.is_active());

    assert!(SolverConfig::cloth().validate().is_ok());
    assert!(SolverConfig::hair().validate().is_ok());
    assert!(SolverConfig::hair().hair_volume.is_active());
    assert_eq!(SolverConfig::debug().gravity, [0.0; 3]);
}

#[test]
fn config_toml_round_trip() {
    let mut config = SolverConfig::hair();
    config.linear_solver = LinearSolverKind::Direct;
    config.springs.no_compression = true;

    let text = config.to_toml_string().unwrap();
    let parsed = SolverConfig::from_toml_str(&text).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn config_partial_toml_uses_defaults() {
    let text = r#"
        linear_solver = "direct"
        cg_tolerance = 0.001

        [springs]
        structural = 40.0
    "#;
    let config = SolverConfig::from_toml_str(text).unwrap();
    assert_eq!(config.linear_solver, LinearSolverKind::Direct);
    assert!((config.springs.structural - 40.0).abs() < 1e-6);
    assert!((config.springs.bending - 0.5).abs() < 1e-6);
    assert_eq!(config.cg_max_iterations, 100);
}

#[test]
fn config_rejects_bad_values() {
    let mut config = SolverConfig::default();
    config.springs.damping = -1.0;
    assert!(matches!(config.validate(), Err(TressError::InvalidConfig(_))));

    let mut config = SolverConfig::default();
    config.cg_tolerance = 0.0;
    assert!(config.validate().is_err());

    let mut config = SolverConfig::default();
    config.grid_resolution = 1;
    assert!(config.validate().is_err());

    let mut config = SolverConfig::default();
    config.gravity = [0.0, f32::NAN, 0.0];
    assert!(config.validate().is_err());

    assert!(matches!(
        SolverConfig::from_toml_str("cg_max_iterations = 0"),
        Err(TressError::InvalidConfig(_))
    ));
    assert!(matches!(
        SolverConfig::from_toml_str("cg_max_iterations = \"many\""),
        Err(TressError::Serialization(_))
    ));
}

#[test]
fn spring_coefficients_blend_stiffness() {
    let params = SpringParams {
        structural: 10.0,
        max_structural: 30.0,
        bending: 1.0,
        max_bending: 3.0,
        avg_spring_length: 2.0,
        ..Default::default()
    };
    assert!((params.stretch_coefficient(0.0) - 5.0).abs() < 1e-4);
    assert!((params.stretch_coefficient(0.5) - 10.0).abs() < 1e-4);
    assert!((params.bending_coefficient(1.0) - 3.0 / 40.0).abs() < 1e-5);
    assert!(params.goal_coefficient(0.0, 0.0).abs() < 1e-9);
}

// ─── Frame Tests ──────────────────────────────────────────────

fn moving_root() -> RootTransform {
    let rotation = Mat3::from_axis_angle(Vec3::new(1.0, 2.0, -0.5).normalize(), 0.7);
    RootTransform::new(
        Vec3::new(0.4, -1.2, 2.0),
        Vec3::new(0.3, 0.1, -0.2),
        rotation,
        Vec3::new(0.5, -0.8, 1.1),
    )
    .with_acceleration(Vec3::new(0.0, -2.0, 0.5), Vec3::new(0.2, 0.1, -0.3))
}

#[test]
fn root_frame_round_trips() {
    let root = moving_root();
    let x = Vec3::new(1.0, 0.5, -0.25);
    let v = Vec3::new(-0.3, 0.8, 0.2);
    let f = Vec3::new(2.0, -1.0, 0.7);
    let mass = 0.8;

    let x_root = RootFrame::position_to_root(&root, x);
    assert!(approx(RootFrame::position_to_world(&root, x_root), x, 1e-5));

    let v_root = RootFrame::velocity_to_root(&root, x_root, v);
    assert!(approx(RootFrame::velocity_to_world(&root, x_root, v_root), v, 1e-5));

    let f_root = RootFrame::force_to_root(&root, x_root, v_root, f, mass);
    let f_back = RootFrame::force_to_world(&root, x_root, v_root, f_root, mass);
    assert!(approx(f_back, f, 1e-4));

    let m = Mat3::from_cols(
        Vec3::new(1.0, 0.2, -0.4),
        Vec3::new(0.2, -3.0, 0.1),
        Vec3::new(-0.4, 0.1, 0.5),
    );
    let dfdx_back = RootFrame::dfdx_to_world(&root, &RootFrame::dfdx_to_root(&root, &m, mass), mass);
    assert!(dfdx_back.abs_diff_eq(m, 1e-4));
    let dfdv_back = RootFrame::dfdv_to_world(&root, &RootFrame::dfdv_to_root(&root, &m, mass), mass);
    assert!(dfdv_back.abs_diff_eq(m, 1e-4));

    let d = Vec3::new(0.0, 0.6, 0.8);
    assert!(approx(RootFrame::direction_to_world(&root, RootFrame::direction_to_root(&root, d)), d, 1e-5));
}

#[test]
fn world_frame_is_identity() {
    let root = moving_root();
    let x = Vec3::new(1.0, 2.0, 3.0);
    let v = Vec3::new(-1.0, 0.0, 1.0);
    assert_eq!(WorldFrame::position_to_root(&root, x), x);
    assert_eq!(WorldFrame::velocity_to_root(&root, x, v), v);
    assert_eq!(WorldFrame::force_to_root(&root, x, v, v, 2.0), v);
    assert_eq!(WorldFrame::acceleration_to_root(&root, x, v, v), v);
}

#[test]
fn identity_root_matches_world() {
    let root = RootTransform::IDENTITY;
    let x = Vec3::new(0.3, -0.7, 1.5);
    let v = Vec3::new(2.0, 0.0, -1.0);
    assert!(approx(RootFrame::position_to_root(&root, x), x, 1e-6));
    assert!(approx(RootFrame::velocity_to_root(&root, x, v), v, 1e-6));
    assert!(approx(RootFrame::force_to_root(&root, x, v, v, 1.0), v, 1e-6));
}

// ─── Spring Tests ─────────────────────────────────────────────

fn eval_pair(spring: &mut Spring, xs: &[Vec3], vs: &[Vec3], params: &SpringParams) {
    let goals = vec![GoalTarget::default(); xs.len()];
    let ctx = SpringContext {
        positions: xs,
        velocities: vs,
        params,
        goals: &goals,
        time: 1.0,
    };
    spring.evaluate(&ctx);
}

#[test]
fn stretch_spring_action_reaction() {
    let params = SpringParams {
        damping: 0.5,
        ..Default::default()
    };
    let xs = [Vec3::ZERO, Vec3::new(1.2, 0.9, 0.0)];
    let vs = [Vec3::new(0.1, 0.0, 0.0), Vec3::new(-0.2, 0.3, 0.1)];

    let mut dfdx = BlockSparseMatrix::new(2, 1);
    let mut dfdv = BlockSparseMatrix::new(2, 1);
    let handle = dfdx.init_spring(0, 0, 1);
    dfdv.init_spring(0, 0, 1);

    let mut spring = Spring::structural(0, 1, 1.0);
    spring.bind(handle);
    eval_pair(&mut spring, &xs, &vs, &params);
    assert!(spring.is_active());

    let mut f = long_vector::zeros(2);
    spring.apply(&mut f, &mut dfdx, &mut dfdv);

    assert!(approx(f[0], -f[1], 1e-6));
    // Stretched: vertex i is pulled towards j.
    assert!(f[0].dot(xs[1] - xs[0]) > 0.0);

    let off = dfdx.block(handle).value;
    assert!(dfdx.diagonal(0).abs_diff_eq(-off, 1e-6));
    assert!(dfdx.diagonal(1).abs_diff_eq(-off, 1e-6));
    assert!(off.abs_diff_eq(off.transpose(), 1e-5));
    assert!(dfdv.block(handle).value.abs_diff_eq(spring.dfdv(), 1e-6));
}

#[test]
fn stretch_spring_inactive_in_compression() {
    let params = SpringParams::default();
    let xs = [Vec3::ZERO, Vec3::new(0.5, 0.0, 0.0)];
    let vs = [Vec3::ZERO; 2];
    let mut spring = Spring::structural(0, 1, 1.0);
    eval_pair(&mut spring, &xs, &vs, &params);
    assert!(!spring.is_active());
    assert_eq!(spring.force(), Vec3::ZERO);

    let params = SpringParams {
        no_compression: true,
        ..Default::default()
    };
    eval_pair(&mut spring, &xs, &vs, &params);
    assert!(spring.is_active());
    // Compressed: vertex i is pushed away from j.
    assert!(spring.force().x < 0.0);
}

#[test]
fn stretch_jacobian_along_spring() {
    let params = SpringParams {
        structural: 100.0,
        max_structural: 100.0,
        ..Default::default()
    };
    let k = params.stretch_coefficient(0.0);
    let xs = [Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)];
    let vs = [Vec3::ZERO; 2];
    let mut spring = Spring::structural(0, 1, 1.0);
    eval_pair(&mut spring, &xs, &vs, &params);

    // Along the spring: k. Across: k·(1 − L/len).
    let jac = spring.dfdx();
    assert!((jac.x_axis.x - k).abs() < 1e-3);
    assert!((jac.y_axis.y - 0.5 * k).abs() < 1e-3);
    assert!((jac.z_axis.z - 0.5 * k).abs() < 1e-3);
}

#[test]
fn sewing_force_is_clamped() {
    let params = SpringParams {
        structural: 100.0,
        max_structural: 100.0,
        max_sewing_force: 2.0,
        damping: 0.0,
        ..Default::default()
    };
    let xs = [Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)];
    let vs = [Vec3::ZERO; 2];
    let mut spring = Spring::new(SpringKind::Sewing, 0, 1, 1.0);
    eval_pair(&mut spring, &xs, &vs, &params);
    assert!(approx(spring.force(), Vec3::new(2.0, 0.0, 0.0), 1e-5));
}

#[test]
fn zero_length_spring_is_finite() {
    let params = SpringParams {
        no_compression: true,
        ..Default::default()
    };
    let xs = [Vec3::ONE, Vec3::ONE];
    let vs = [Vec3::ZERO, Vec3::X];
    let mut spring = Spring::structural(0, 1, 0.0);
    eval_pair(&mut spring, &xs, &vs, &params);
    assert!(spring.is_active());
    assert!(spring.force().is_finite());
    assert!(spring.dfdx().is_finite());
    assert!(spring.dfdv().is_finite());
}

#[test]
fn bending_branch_selection() {
    // Strong compression: the linear fallback wins.
    let (force, slope, linear) = spring::fbstar(0.1, 1.0, 2.0, 2.0);
    assert!(linear);
    assert!((force - (-1.8)).abs() < 1e-5);
    assert!((slope - 2.0).abs() < 1e-6);

    // Mild relative compression of a long spring: the quartic wins.
    let (force, slope, linear) = spring::fbstar(5.0, 10.0, 1.0, 1.0);
    assert!(!linear);
    assert!((force - spring::fb(5.0, 10.0)).abs() < 1e-5);
    assert!((slope - spring::fb_derivative(5.0, 10.0)).abs() < 1e-5);
}

#[test]
fn bending_derivative_matches_finite_difference() {
    let h = 1e-3;
    for x in [0.2_f32, 0.5, 0.8] {
        let numeric = (spring::fb(x + h, 1.0) - spring::fb(x - h, 1.0)) / (2.0 * h);
        let analytic = spring::fb_derivative(x, 1.0);
        assert!((numeric - analytic).abs() < 1e-2, "x = {x}: {numeric} vs {analytic}");
    }
}

#[test]
fn bending_spring_jacobian_uses_winning_branch() {
    let params = SpringParams {
        bending: 20.0,
        max_bending: 20.0,
        ..Default::default()
    };
    let kb = params.bending_coefficient(0.0);
    let xs = [Vec3::ZERO, Vec3::new(0.0, 0.1, 0.0)];
    let vs = [Vec3::ZERO; 2];
    let mut spring = Spring::bending(0, 1, 1.0);
    eval_pair(&mut spring, &xs, &vs, &params);

    assert!(spring.is_active());
    assert!(spring.used_linear_branch());
    assert!(spring.dfdx().abs_diff_eq(outer(Vec3::Y, Vec3::Y) * kb, 1e-5));
    assert_eq!(spring.dfdv(), Mat3::ZERO);
    // Compressed bending spring pushes i away from j.
    assert!(spring.force().y < 0.0);

    // Bending springs never act in extension.
    let xs = [Vec3::ZERO, Vec3::new(0.0, 1.5, 0.0)];
    eval_pair(&mut spring, &xs, &vs, &params);
    assert!(!spring.is_active());
}

#[test]
fn goal_spring_pulls_towards_interpolated_target() {
    let params = SpringParams::default();
    let xs = [Vec3::ZERO];
    let vs = [Vec3::ZERO];
    let goals = [GoalTarget {
        old: Vec3::ZERO,
        new: Vec3::new(2.0, 0.0, 0.0),
        weight: 1.0,
    }];
    let ctx = SpringContext {
        positions: &xs,
        velocities: &vs,
        params: &params,
        goals: &goals,
        time: 0.5,
    };
    let mut spring = Spring::goal(0, 0);
    spring.evaluate(&ctx);

    let k = params.goal_coefficient(0.0, 1.0);
    assert!(approx(spring.force(), Vec3::new(k, 0.0, 0.0), 1e-5));
    assert_eq!(spring.dfdx(), Mat3::ZERO);
}

#[test]
fn deactivated_spring_contributes_nothing() {
    let params = SpringParams::default();
    let xs = [Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0)];
    let vs = [Vec3::ZERO; 2];
    let mut spring = Spring::structural(0, 1, 1.0);
    spring.deactivated = true;
    eval_pair(&mut spring, &xs, &vs, &params);
    assert!(!spring.is_active());
    assert_eq!(spring.force(), Vec3::ZERO);
}

// ─── External Force Tests ─────────────────────────────────────

#[test]
fn gravity_scales_with_mass() {
    let mut f = long_vector::zeros(2);
    let xs = [Vec3::ZERO; 2];
    let vs = [Vec3::ZERO; 2];
    let roots = [RootTransform::IDENTITY; 2];
    forces::add_gravity::<WorldFrame>(&mut f, &xs, &vs, &[1.0, 2.5], &roots, Vec3::new(0.0, -9.81, 0.0));
    assert!((f[0].y + 9.81).abs() < 1e-5);
    assert!((f[1].y + 2.5 * 9.81).abs() < 1e-4);
}

#[test]
fn drag_opposes_velocity() {
    let mut f = long_vector::zeros(1);
    let mut dfdv = BlockSparseMatrix::new(1, 0);
    let vs = [Vec3::new(2.0, -1.0, 0.0)];
    forces::add_drag(&mut f, &mut dfdv, &vs, 10.0);
    assert!(approx(f[0], Vec3::new(-0.2, 0.1, 0.0), 1e-6));
    assert!(dfdv.diagonal(0).abs_diff_eq(Mat3::IDENTITY * -0.1, 1e-6));

    let mut f = long_vector::zeros(1);
    forces::add_drag(&mut f, &mut dfdv, &vs, 0.0);
    assert_eq!(f[0], Vec3::ZERO);
}

#[test]
fn face_wind_pushes_along_wind() {
    let xs = [Vec3::ZERO, Vec3::X, Vec3::Y];
    let wind = [Vec3::new(0.0, 0.0, 5.0); 3];
    let faces = [Face::Tri([0, 1, 2])];
    let mut f = long_vector::zeros(3);
    forces::add_face_wind(&mut f, &xs, &faces, &wind);
    for force in &f {
        assert!(force.dot(wind[0]) > 0.0);
        assert!(force.x.abs() < 1e-6 && force.y.abs() < 1e-6);
    }

    // Wind in the plane of the face has no effect.
    let wind = [Vec3::new(3.0, 1.0, 0.0); 3];
    let mut f = long_vector::zeros(3);
    forces::add_face_wind(&mut f, &xs, &faces, &wind);
    assert!(f.iter().all(|v| v.length() < 1e-6));
}

#[test]
fn strand_wind_is_perpendicular_to_edge() {
    let xs = [Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)];
    let wind = [Vec3::new(1.0, 1.0, 0.0); 2];
    let springs = [Spring::structural(0, 1, 2.0), Spring::bending(0, 1, 2.0)];
    let mut f = long_vector::zeros(2);
    forces::add_strand_wind(&mut f, &xs, &springs, &wind);
    for force in &f {
        assert!(force.x.abs() < 1e-6);
        assert!((force.y - 0.02).abs() < 1e-6);
    }
}

#[test]
fn face_normals() {
    let xs = [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y];
    let tri = Face::Tri([0, 1, 2]);
    let quad = Face::Quad([0, 1, 2, 3]);
    assert!(tri.normal(&xs).cross(Vec3::Z).length() < 1e-6);
    assert!(quad.normal(&xs).cross(Vec3::Z).length() < 1e-6);
    assert_eq!(quad.vertices().len(), 4);
}

// ─── Grid Tests ───────────────────────────────────────────────

fn scattered_points(n: usize) -> Vec<Vec3> {
    (0..n)
        .map(|i| {
            let t = i as f32;
            Vec3::new((t * 0.37).sin(), (t * 0.11).cos() * 2.0, (t * 0.73).sin() * 0.5)
        })
        .collect()
}

#[test]
fn grid_conserves_density() {
    let points = scattered_points(200);
    let velocities = vec![Vec3::X; points.len()];
    let grid = InteractionGrid::build(10, &points, &velocities);
    assert!((grid.total_density() - 200.0).abs() < 1e-2);
    assert!(grid.occupied_cells() > 0);

    // Uniform input velocity survives normalization.
    for cell in grid.cells().iter().filter(|c| c.density > 0.0) {
        assert!(approx(cell.velocity, Vec3::X, 1e-4));
    }
}

#[test]
fn grid_skips_points_out_of_bounds() {
    let mut grid = InteractionGrid::with_bounds(4, Vec3::ZERO, Vec3::ONE);
    assert!((grid.splat(Vec3::splat(0.5), Vec3::ZERO) - 1.0).abs() < 1e-5);
    assert_eq!(grid.splat(Vec3::new(1.5, 0.5, 0.5), Vec3::ZERO), 0.0);
    assert!((grid.total_density() - 1.0).abs() < 1e-5);
}

#[test]
fn grid_export_layout() {
    let points = [Vec3::ZERO, Vec3::splat(2.0)];
    let velocities = [Vec3::new(1.0, 2.0, 2.0), Vec3::ZERO];
    let grid = InteractionGrid::build(3, &points, &velocities);
    let n = 27;

    let density = grid.export(GridChannel::Density);
    assert_eq!(density.len(), n);
    assert!((density[0] - 1.0).abs() < 1e-5);
    assert!((density[26] - 1.0).abs() < 1e-5);

    let velocity = grid.export(GridChannel::Velocity);
    assert_eq!(velocity.len(), 4 * n);
    assert!((velocity[0] - 1.0).abs() < 1e-5);
    assert!((velocity[n] - 2.0).abs() < 1e-5);
    assert!((velocity[2 * n] - 2.0).abs() < 1e-5);
    assert!((velocity[3 * n] - 3.0).abs() < 1e-5);
}

#[test]
fn grid_gradient_points_away_from_density() {
    let mut grid = InteractionGrid::with_bounds(3, Vec3::ZERO, Vec3::splat(2.0));
    for _ in 0..10 {
        grid.splat(Vec3::ZERO, Vec3::ZERO);
    }
    grid.normalize();
    let sample = grid.sample(Vec3::splat(0.5));
    assert!(sample.neg_gradient.x > 0.0);
    assert!(sample.neg_gradient.y > 0.0);
    assert!(sample.neg_gradient.z > 0.0);
    assert!(sample.density > 0.0);
}

#[test]
fn grid_bounds_of_empty_set() {
    assert_eq!(grid::bounds(&[]), (Vec3::ZERO, Vec3::ZERO));
}

#[test]
fn velocity_smoothing_pulls_towards_neighbours() {
    let xs = [Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)];
    let vs = [Vec3::X, Vec3::ZERO, Vec3::ZERO];
    let params = HairVolumeParams {
        velocity_smooth: 0.5,
        ..Default::default()
    };
    let mut f = long_vector::zeros(3);
    let stats = grid::add_volume_forces(&mut f, &xs, &vs, &[], &params, 2).unwrap();
    assert!((stats.total_density - 3.0).abs() < 1e-4);
    assert!(f[0].x < 0.0);
    assert!(f[1].x > 0.0);
}

#[test]
fn collider_friction_drags_towards_collider() {
    let xs = [Vec3::ZERO, Vec3::ONE];
    let vs = [Vec3::ZERO; 2];
    let colliders = [ColliderPoint {
        position: Vec3::ZERO,
        velocity: Vec3::new(0.0, 0.0, 3.0),
    }];
    let params = HairVolumeParams {
        collider_friction: 0.5,
        ..Default::default()
    };
    let mut f = long_vector::zeros(2);
    let stats = grid::add_volume_forces(&mut f, &xs, &vs, &colliders, &params, 4);
    assert!(stats.is_none());
    assert!(f[0].z > 0.0);
    assert_eq!(f[1], Vec3::ZERO);
}

/// Ten vertices in a dense clump at the origin, one halfway into the
/// first cell, one at the far corner.
fn clumped_points() -> Vec<Vec3> {
    let mut xs = vec![Vec3::ZERO; 10];
    xs.push(Vec3::splat(0.5));
    xs.push(Vec3::splat(2.0));
    xs
}

#[test]
fn pressure_pushes_away_from_dense_clump() {
    let xs = clumped_points();
    let vs = vec![Vec3::ZERO; xs.len()];
    let params = HairVolumeParams {
        pressure: 1.0,
        pressure_threshold: 1.0,
        ..Default::default()
    };
    let mut f = long_vector::zeros(xs.len());
    let stats = grid::add_volume_forces(&mut f, &xs, &vs, &[], &params, 3).unwrap();
    assert!((stats.total_density - 12.0).abs() < 1e-4);

    // At (0.5, 0.5, 0.5) the gradient is 2.5 per axis, pointing away from the clump.
    let push = f[10];
    let expected = (3.0f32 * 2.5 * 2.5).sqrt() - 1.0;
    assert!(push.x > 0.0 && push.y > 0.0 && push.z > 0.0);
    assert!((push.x - push.y).abs() < 1e-5 && (push.y - push.z).abs() < 1e-5);
    assert!((push.length() - expected).abs() < 1e-4);
}

#[test]
fn pressure_below_threshold_is_silent() {
    let xs = clumped_points();
    let vs = vec![Vec3::ZERO; xs.len()];
    let params = HairVolumeParams {
        pressure: 1.0,
        pressure_threshold: 100.0,
        ..Default::default()
    };
    let mut f = long_vector::zeros(xs.len());
    let stats = grid::add_volume_forces(&mut f, &xs, &vs, &[], &params, 3);
    // Pressure alone still builds the grid.
    assert!(stats.is_some());
    assert!(f.iter().all(|v| *v == Vec3::ZERO));
}

#[test]
fn straight_strand_has_no_sideways_pressure() {
    let xs: Vec<Vec3> = (0..10).map(|i| Vec3::new(i as f32 * 0.1, 1.6, 0.0)).collect();
    let vs = vec![Vec3::ZERO; xs.len()];
    let params = HairVolumeParams {
        pressure: 1.0,
        pressure_threshold: 0.0,
        ..Default::default()
    };
    let mut f = long_vector::zeros(xs.len());
    let stats = grid::add_volume_forces(&mut f, &xs, &vs, &[], &params, 10).unwrap();
    assert!((stats.total_density - 10.0).abs() < 1e-3);
    for force in &f {
        assert_eq!(force.y, 0.0);
        assert_eq!(force.z, 0.0);
    }
}

#[test]
fn flat_sheet_samples_without_normal_gradient() {
    let xs: Vec<Vec3> = (0..16)
        .map(|i| Vec3::new((i % 4) as f32, (i / 4) as f32, 0.3))
        .collect();
    let grid = InteractionGrid::build(2, &xs, &[Vec3::ZERO; 16]);
    assert!((grid.total_density() - 16.0).abs() < 1e-3);
    assert!(grid.min().z < 0.3 && grid.max().z > 0.3);

    let sample = grid.sample(Vec3::new(1.0, 2.0, 0.3));
    assert!(sample.density > 0.0);
    assert_eq!(sample.neg_gradient.z, 0.0);
}

#[test]
fn inactive_volume_params_build_nothing() {
    let xs = scattered_points(10);
    let vs = vec![Vec3::ZERO; 10];
    let mut f = long_vector::zeros(10);
    let stats = grid::add_volume_forces(&mut f, &xs, &vs, &[], &HairVolumeParams::default(), 10);
    assert!(stats.is_none());
    assert!(f.iter().all(|v| *v == Vec3::ZERO));
}

// ─── Constraint Tests ─────────────────────────────────────────

#[test]
fn filter_is_idempotent() {
    let mut constraints = ConstraintSet::new(4);
    constraints.slide_line(0, Vec3::X, Vec3::Y, Vec3::ZERO);
    constraints.slide_plane(1, Vec3::new(1.0, 1.0, 0.0).normalize(), Vec3::ZERO);
    constraints.pin(2, Vec3::ONE);
    assert!(constraints.is_free(3));
    assert!(!constraints.is_free(1));

    let mut once = vec![Vec3::new(1.0, 2.0, 3.0); 4];
    constraints.filter(&mut once);
    let mut twice = once.clone();
    constraints.filter(&mut twice);
    for (a, b) in once.iter().zip(&twice) {
        assert!(approx(*a, *b, 1e-6));
    }
    assert!(approx(once[0], Vec3::new(0.0, 0.0, 3.0), 1e-6));
    assert_eq!(once[2], Vec3::ZERO);
    assert_eq!(once[3], Vec3::new(1.0, 2.0, 3.0));
}

#[test]
fn sliding_targets_accumulate() {
    let mut constraints = ConstraintSet::new(1);
    constraints.slide_plane(0, Vec3::Y, Vec3::new(0.0, 1.0, 0.0));
    constraints.slide_plane(0, Vec3::Y, Vec3::new(0.0, 1.0, 0.0));
    assert_eq!(constraints.target_of(0), Vec3::new(0.0, 2.0, 0.0));

    constraints.clear();
    assert!(constraints.is_free(0));
    assert_eq!(constraints.target_of(0), Vec3::ZERO);
}

// ─── Linear Solver Tests ──────────────────────────────────────

/// SPD chain of `n` vertices: diagonal 4·I, neighbours −(I + small coupling).
fn spd_chain(n: usize) -> BlockSparseMatrix {
    let mut a = BlockSparseMatrix::new(n, n - 1);
    a.fill_diagonal(Mat3::IDENTITY * 4.0);
    for i in 0..n - 1 {
        let h = a.init_spring(i, i, i + 1);
        let d = Vec3::new(1.0, i as f32 * 0.3, 0.5).normalize();
        *a.block_mut(h) = -(Mat3::IDENTITY + outer(d, d) * 0.3);
    }
    a
}

fn chain_rhs(n: usize) -> Vec<Vec3> {
    (0..n)
        .map(|i| Vec3::new(1.0, -(i as f32) * 0.5, (i as f32).sin()))
        .collect()
}

#[test]
fn cg_matches_direct_unconstrained() {
    let n = 6;
    let a = spd_chain(n);
    let b = chain_rhs(n);
    let constraints = ConstraintSet::new(n);

    let settings = CgSettings {
        max_iterations: 200,
        tolerance: 1e-5,
    };
    let mut dv_cg = long_vector::zeros(n);
    let mut iterations_seen = 0;
    let outcome = cg::solve_filtered(&a, &b, &constraints, &settings, &mut dv_cg, |it, _| {
        iterations_seen = it;
    });
    assert!(outcome.converged);
    assert_eq!(outcome.iterations, iterations_seen);

    let mut dv_direct = long_vector::zeros(n);
    projected::solve_projected(&a, &b, &constraints, &mut dv_direct).unwrap();
    for i in 0..n {
        assert!(approx(dv_cg[i], dv_direct[i], 1e-4), "vertex {i}");
    }
}

#[test]
fn cg_matches_direct_constrained() {
    let n = 6;
    let a = spd_chain(n);
    let b = chain_rhs(n);
    let mut constraints = ConstraintSet::new(n);
    constraints.pin(0, Vec3::new(0.1, 0.0, -0.2));
    constraints.slide_plane(3, Vec3::Y, Vec3::new(0.0, 0.05, 0.0));
    constraints.slide_line(5, Vec3::X, Vec3::Z, Vec3::ZERO);

    let settings = CgSettings {
        max_iterations: 200,
        tolerance: 1e-5,
    };
    let mut dv_cg = long_vector::zeros(n);
    let outcome = cg::solve_filtered(&a, &b, &constraints, &settings, &mut dv_cg, |_, _| {});
    assert!(outcome.converged);

    let mut dv_direct = long_vector::zeros(n);
    projected::solve_projected(&a, &b, &constraints, &mut dv_direct).unwrap();
    for i in 0..n {
        assert!(approx(dv_cg[i], dv_direct[i], 1e-4), "vertex {i}");
    }

    for dv in [&dv_cg, &dv_direct] {
        assert!(approx(dv[0], Vec3::new(0.1, 0.0, -0.2), 1e-6));
        assert!((dv[3].y - 0.05).abs() < 1e-5);
        assert!(dv[5].x.abs() < 1e-5 && dv[5].z.abs() < 1e-5);
    }
}

#[test]
fn cg_fully_pinned_returns_targets() {
    let n = 3;
    let a = spd_chain(n);
    let b = chain_rhs(n);
    let mut constraints = ConstraintSet::new(n);
    for i in 0..n {
        constraints.pin(i, Vec3::splat(i as f32));
    }
    let settings = CgSettings {
        max_iterations: 10,
        tolerance: 1e-3,
    };
    let mut dv = long_vector::zeros(n);
    let outcome = cg::solve_filtered(&a, &b, &constraints, &settings, &mut dv, |_, _| {});
    assert!(outcome.converged);
    assert_eq!(outcome.iterations, 0);
    for i in 0..n {
        assert_eq!(dv[i], Vec3::splat(i as f32));
    }
}

#[test]
fn cg_reports_iteration_cap() {
    let n = 20;
    let a = spd_chain(n);
    let b = chain_rhs(n);
    let settings = CgSettings {
        max_iterations: 1,
        tolerance: 1e-6,
    };
    let mut dv = long_vector::zeros(n);
    let outcome = cg::solve_filtered(&a, &b, &ConstraintSet::new(n), &settings, &mut dv, |_, _| {});
    assert!(!outcome.converged);
    assert_eq!(outcome.iterations, 1);
}

#[test]
fn cg_detects_indefinite_matrix() {
    let mut a = BlockSparseMatrix::new(1, 0);
    a.fill_diagonal(Mat3::IDENTITY * -1.0);
    let b = [Vec3::ONE];
    let settings = CgSettings {
        max_iterations: 10,
        tolerance: 1e-3,
    };
    let mut dv = long_vector::zeros(1);
    let outcome = cg::solve_filtered(&a, &b, &ConstraintSet::new(1), &settings, &mut dv, |_, _| {});
    assert!(!outcome.converged);
    assert_eq!(outcome.iterations, 0);
}

#[test]
fn projected_matrix_replaces_pinned_rows() {
    let a = spd_chain(3);
    let mut constraints = ConstraintSet::new(3);
    constraints.pin(1, Vec3::ZERO);
    let p = projected::project_matrix(&a, &constraints);
    assert!(p.diagonal(1).abs_diff_eq(Mat3::IDENTITY, 1e-6));
    assert!(p.diagonal(0).abs_diff_eq(*a.diagonal(0), 1e-6));
    for block in p.off_diagonal() {
        assert!(block.value.abs_diff_eq(Mat3::ZERO, 1e-6));
    }
}

// ─── Solver Tests ─────────────────────────────────────────────

/// Two unit masses joined by a spring of rest length 1, stretched to 1.5.
///
/// `no_compression` keeps the spring active while it is shorter than its
/// rest length. With the default policy a compressed stretch spring exerts
/// nothing, so the overshooting pair would pass through itself.
fn spring_pair(kind: LinearSolverKind) -> ImplicitSolver<WorldFrame> {
    let mut config = SolverConfig::debug();
    config.springs = SpringParams {
        structural: 100.0,
        max_structural: 100.0,
        damping: 0.5,
        avg_spring_length: 1.0,
        no_compression: true,
        ..Default::default()
    };
    config.cg_max_iterations = 100;
    config.linear_solver = kind;

    let mut solver = ImplicitSolver::<WorldFrame>::new(2, 1, config).unwrap();
    solver.set_position(0, Vec3::ZERO).unwrap();
    solver.set_position(1, Vec3::new(1.5, 0.0, 0.0)).unwrap();
    solver.set_spring(0, Spring::structural(0, 1, 1.0)).unwrap();
    solver
}

fn pair_length(solver: &ImplicitSolver<WorldFrame>) -> f32 {
    let (x0, _) = solver.motion_state(0).unwrap();
    let (x1, _) = solver.motion_state(1).unwrap();
    (x1 - x0).length()
}

#[test]
fn spring_pair_relaxes_to_rest_length() {
    let mut solver = spring_pair(LinearSolverKind::ConjugateGradient);
    let dt = 0.01;

    let report = solver.solve(dt).unwrap();
    assert!(report.converged);
    assert_eq!(report.active_springs, 1);
    solver.commit();
    let first = pair_length(&solver);
    assert!(first < 1.5 && first > 0.0);

    let mut early_peak = 0.0_f32;
    let mut late_peak = 0.0_f32;
    for step in 1..1000 {
        let report = solver.solve(dt).unwrap();
        assert!(report.converged, "step {step}");
        solver.commit();
        let len = pair_length(&solver);
        assert!(len > 0.0, "step {step}: collapsed");
        let deviation = (len - 1.0).abs();
        if step < 500 {
            early_peak = early_peak.max(deviation);
        } else {
            late_peak = late_peak.max(deviation);
        }
    }
    assert!(late_peak <= early_peak);
    assert!((pair_length(&solver) - 1.0).abs() < 1e-2);
}

#[test]
fn spring_pair_solvers_agree() {
    let mut cg_solver = spring_pair(LinearSolverKind::ConjugateGradient);
    let mut direct_solver = spring_pair(LinearSolverKind::Direct);
    for _ in 0..20 {
        cg_solver.solve(0.01).unwrap();
        direct_solver.solve(0.01).unwrap();
        cg_solver.commit();
        direct_solver.commit();
    }
    for i in 0..2 {
        let (x_cg, v_cg) = cg_solver.motion_state(i).unwrap();
        let (x_direct, v_direct) = direct_solver.motion_state(i).unwrap();
        assert!(approx(x_cg, x_direct, 1e-3));
        assert!(approx(v_cg, v_direct, 1e-2));
    }
}

#[test]
fn pinned_vertex_follows_target() {
    let mut solver = spring_pair(LinearSolverKind::ConjugateGradient);
    let target = Vec3::new(0.1, 0.0, 0.0);
    solver.add_constraint_ndof0(0, target).unwrap();
    solver.solve(0.01).unwrap();

    let state = solver.state();
    assert!(approx(state.new_velocities[0] - state.velocities[0], target, 1e-6));
    // The free end still moves towards the pinned one.
    assert!(state.new_velocities[1].x < 0.0);
}

#[test]
fn gravity_step_matches_free_fall() {
    let mut config = SolverConfig::default();
    config.air_viscosity = 0.0;
    let mut solver = ImplicitSolver::<WorldFrame>::new(1, 0, config).unwrap();
    let dt = 0.02;
    let report = solver.solve(dt).unwrap();
    assert!(report.converged);

    let v = solver.state().new_velocities[0];
    assert!(approx(v, Vec3::new(0.0, -9.81 * dt, 0.0), 1e-5));
    assert!(approx(solver.state().new_positions[0], v * dt, 1e-6));

    // Nothing changes until commit.
    assert_eq!(solver.motion_state(0).unwrap().1, Vec3::ZERO);
    solver.commit();
    assert!(approx(solver.motion_state(0).unwrap().1, v, 1e-6));
}

#[test]
fn gravity_in_rotated_root_frame() {
    let mut config = SolverConfig::default();
    config.air_viscosity = 0.0;
    let mut solver = ImplicitSolver::<RootFrame>::new(1, 0, config).unwrap();
    let rotation = Mat3::from_rotation_z(std::f32::consts::FRAC_PI_2);
    solver
        .set_root_motion(0, Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO, rotation, Vec3::ZERO)
        .unwrap();
    solver.set_motion_state(0, Vec3::new(1.0, 5.0, 0.0), Vec3::ZERO).unwrap();

    let (x, v) = solver.motion_state(0).unwrap();
    assert!(approx(x, Vec3::new(1.0, 5.0, 0.0), 1e-5));
    assert!(approx(v, Vec3::ZERO, 1e-6));

    let dt = 0.01;
    solver.solve(dt).unwrap();
    solver.commit();
    let (_, v) = solver.motion_state(0).unwrap();
    assert!(approx(v, Vec3::new(0.0, -9.81 * dt, 0.0), 1e-5));
}

#[test]
fn drag_slows_free_vertex() {
    let mut config = SolverConfig::debug();
    config.air_viscosity = 50.0;
    let mut solver = ImplicitSolver::<WorldFrame>::new(1, 0, config).unwrap();
    solver.set_velocity(0, Vec3::new(2.0, 0.0, 0.0)).unwrap();
    solver.solve(0.1).unwrap();
    let v = solver.state().new_velocities[0];
    assert!(v.x < 2.0 && v.x > 0.0);
}

#[test]
fn goal_spring_pulls_vertex() {
    let mut solver = ImplicitSolver::<WorldFrame>::new(1, 1, SolverConfig::debug()).unwrap();
    solver.set_spring(0, Spring::goal(0, 0)).unwrap();
    solver
        .set_goal_target(0, Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), 1.0)
        .unwrap();
    solver.set_goal_time(1.0);
    solver.solve(0.01).unwrap();
    assert!(solver.state().new_velocities[0].x > 0.0);
}

#[test]
fn deactivated_spring_is_skipped() {
    let mut solver = spring_pair(LinearSolverKind::ConjugateGradient);
    solver.deactivate_spring(0).unwrap();
    let report = solver.solve(0.01).unwrap();
    assert_eq!(report.active_springs, 0);
    assert_eq!(solver.state().new_velocities[1], Vec3::ZERO);
    assert!(solver.spring(0).unwrap().deactivated);
}

#[test]
fn constrained_sheet_solvers_agree() {
    let build = |kind| {
        let mut config = SolverConfig::cloth();
        config.linear_solver = kind;
        config.cg_tolerance = 1e-5;
        config.cg_max_iterations = 200;

        let mut springs = Vec::new();
        for r in 0..3 {
            for c in 0..3 {
                if c < 2 {
                    springs.push(Spring::structural(r * 3 + c, r * 3 + c + 1, 1.0));
                }
                if r < 2 {
                    springs.push(Spring::structural(r * 3 + c, (r + 1) * 3 + c, 1.0));
                }
            }
        }
        let mut solver = ImplicitSolver::<WorldFrame>::new(9, springs.len(), config).unwrap();
        for (slot, spring) in springs.into_iter().enumerate() {
            solver.set_spring(slot, spring).unwrap();
        }
        for i in 0..9 {
            let (r, c) = (i / 3, i % 3);
            solver
                .set_position(i, Vec3::new(c as f32, -(r as f32), 0.0) * 1.3)
                .unwrap();
        }
        solver.add_constraint_ndof0(0, Vec3::ZERO).unwrap();
        solver.add_constraint_ndof0(2, Vec3::ZERO).unwrap();
        solver.add_constraint_ndof2(4, Vec3::Y, Vec3::ZERO).unwrap();
        solver.add_constraint_ndof1(6, Vec3::X, Vec3::Y, Vec3::ZERO).unwrap();
        solver
    };

    let mut cg_solver = build(LinearSolverKind::ConjugateGradient);
    let mut direct_solver = build(LinearSolverKind::Direct);
    let cg_report = cg_solver.solve(0.05).unwrap();
    let direct_report = direct_solver.solve(0.05).unwrap();
    assert!(cg_report.converged && direct_report.converged);
    assert_eq!(direct_report.iterations, 1);

    let v_cg = &cg_solver.state().new_velocities;
    let v_direct = &direct_solver.state().new_velocities;
    let scale = v_direct.iter().map(|v| v.length()).fold(0.0_f32, f32::max);
    for i in 0..9 {
        assert!(
            (v_cg[i] - v_direct[i]).length() <= 1e-3 * scale + 1e-6,
            "vertex {i}: {:?} vs {:?}",
            v_cg[i],
            v_direct[i]
        );
    }
    for v in [v_cg, v_direct] {
        assert_eq!(v[0], Vec3::ZERO);
        assert_eq!(v[2], Vec3::ZERO);
        assert!(v[4].y.abs() < 1e-5);
        assert!(v[6].length() < 1e-5);
    }
}

#[test]
fn hair_volume_reports_grid() {
    let points = scattered_points(30);
    let mut solver = ImplicitSolver::<WorldFrame>::new(30, 0, SolverConfig::hair()).unwrap();
    for (i, p) in points.iter().enumerate() {
        solver.set_position(i, *p).unwrap();
    }
    let report = solver.solve(0.01).unwrap();
    let stats = report.grid.unwrap();
    assert!((stats.total_density - 30.0).abs() < 1e-3);

    let density = solver.hair_grid_export(GridChannel::Density);
    assert_eq!(density.len(), 1000);
    let velocity = solver.hair_grid_export(GridChannel::Velocity);
    assert_eq!(velocity.len(), 4000);
}

#[test]
fn empty_solver_steps() {
    let mut solver = ImplicitSolver::<WorldFrame>::new(0, 0, SolverConfig::default()).unwrap();
    let report = solver.solve(0.01).unwrap();
    assert!(report.converged);
    assert_eq!(report.iterations, 0);
}

#[test]
fn telemetry_events_in_order() {
    let sink = VecSink::new();
    let mut bus = EventBus::new();
    bus.add_sink(Box::new(sink.clone()));

    let mut solver = spring_pair(LinearSolverKind::ConjugateGradient);
    solver.attach_telemetry(bus);
    solver.solve(0.01).unwrap();
    solver.commit();
    solver.solve(0.01).unwrap();

    let events = sink.events();
    assert!(matches!(events.first().map(|e| &e.kind), Some(EventKind::StepBegin { .. })));
    assert!(matches!(events.last().map(|e| &e.kind), Some(EventKind::StepEnd { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e.kind, EventKind::SpringActivity { active: 1, total: 1 })));
    assert!(events
        .iter()
        .any(|e| matches!(e.kind, EventKind::Convergence { converged: true, .. })));
    assert!(events.iter().any(|e| matches!(e.kind, EventKind::CgIteration { .. })));
    assert_eq!(events.first().map(|e| e.timestep), Some(0));
    assert_eq!(events.last().map(|e| e.timestep), Some(1));
    drop(events);

    assert!(solver.detach_telemetry().is_some());
    assert!(solver.telemetry_mut().is_none());
}

#[test]
fn clear_constraints_frees_pinned_vertex() {
    let mut solver = spring_pair(LinearSolverKind::ConjugateGradient);
    solver.add_constraint_ndof0(0, Vec3::ZERO).unwrap();
    assert!(!solver.constraints().is_free(0));

    solver.clear_constraints();
    assert!(solver.constraints().is_free(0));
    solver.solve(0.01).unwrap();
    // Both ends now move towards each other.
    assert!(solver.state().new_velocities[0].x > 0.0);
    assert!(solver.state().new_velocities[1].x < 0.0);
}

#[test]
fn spring_params_apply_on_next_step() {
    let mut solver = spring_pair(LinearSolverKind::ConjugateGradient);
    solver.set_spring_params(SpringParams {
        structural: 0.0,
        max_structural: 0.0,
        damping: 0.0,
        avg_spring_length: 1.0,
        no_compression: true,
        ..Default::default()
    });
    assert_eq!(solver.config().springs.structural, 0.0);

    let report = solver.solve(0.01).unwrap();
    assert_eq!(report.active_springs, 1);
    assert!(approx(solver.state().new_velocities[1], Vec3::ZERO, 1e-6));
}

#[test]
fn resting_strand_gains_no_sideways_momentum() {
    let mut config = SolverConfig::debug();
    config.hair_volume = HairVolumeParams {
        pressure: 1.0,
        ..Default::default()
    };
    let mut solver = ImplicitSolver::<WorldFrame>::new(10, 0, config).unwrap();
    for i in 0..10 {
        solver.set_position(i, Vec3::new(i as f32 * 0.1, 0.0, 0.0)).unwrap();
    }
    let report = solver.solve(0.01).unwrap();
    assert!(report.grid.is_some());

    let sideways: f32 = solver
        .state()
        .new_velocities
        .iter()
        .map(|v| v.y.abs() + v.z.abs())
        .sum();
    assert_eq!(sideways, 0.0);
}

#[test]
fn hair_volume_can_be_switched_on() {
    let points = scattered_points(10);
    let mut solver = ImplicitSolver::<WorldFrame>::new(10, 0, SolverConfig::debug()).unwrap();
    for (i, p) in points.iter().enumerate() {
        solver.set_position(i, *p).unwrap();
    }
    assert!(solver.solve(0.01).unwrap().grid.is_none());

    solver.set_hair_volume(HairVolumeParams {
        velocity_smooth: 1.0,
        ..Default::default()
    });
    let stats = solver.solve(0.01).unwrap().grid.unwrap();
    assert!((stats.total_density - 10.0).abs() < 1e-3);
}

// ─── Error Tests ──────────────────────────────────────────────

#[test]
fn invalid_timestep_is_rejected() {
    let mut solver = spring_pair(LinearSolverKind::ConjugateGradient);
    assert!(matches!(solver.solve(0.0), Err(TressError::InvalidTimestep(_))));
    assert!(matches!(solver.solve(-0.01), Err(TressError::InvalidTimestep(_))));
    assert!(solver.solve(f32::NAN).is_err());
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = SolverConfig::default();
    config.cg_max_iterations = 0;
    assert!(matches!(
        ImplicitSolver::<WorldFrame>::new(2, 1, config),
        Err(TressError::InvalidConfig(_))
    ));
}

#[test]
fn index_errors() {
    let mut solver = spring_pair(LinearSolverKind::ConjugateGradient);
    assert!(matches!(
        solver.set_position(5, Vec3::ZERO),
        Err(TressError::IndexOutOfRange { kind: "vertex", index: 5, len: 2 })
    ));
    assert!(solver.motion_state(2).is_err());
    assert!(solver.add_constraint_ndof0(3, Vec3::ZERO).is_err());
    assert!(matches!(
        solver.set_spring(4, Spring::structural(0, 1, 1.0)),
        Err(TressError::IndexOutOfRange { kind: "spring slot", .. })
    ));
    assert!(matches!(
        solver.set_spring(0, Spring::structural(0, 7, 1.0)),
        Err(TressError::InvalidSpring(_))
    ));
    assert!(matches!(
        solver.set_spring(0, Spring::structural(1, 1, 1.0)),
        Err(TressError::InvalidSpring(_))
    ));
    assert!(matches!(
        solver.set_spring(0, Spring::structural(0, 1, -1.0)),
        Err(TressError::InvalidSpring(_))
    ));
    assert!(matches!(
        solver.set_wind(Some(vec![Vec3::X; 3])),
        Err(TressError::DimensionMismatch { expected: 2, found: 3 })
    ));
    assert!(solver.set_faces(vec![Face::Tri([0, 1, 9])]).is_err());
}

#[test]
fn unregistered_slot_cannot_be_deactivated() {
    let mut solver = ImplicitSolver::<WorldFrame>::new(2, 2, SolverConfig::debug()).unwrap();
    solver.set_spring(0, Spring::structural(0, 1, 1.0)).unwrap();
    assert!(solver.deactivate_spring(0).is_ok());
    assert!(matches!(solver.deactivate_spring(1), Err(TressError::InvalidSpring(_))));
    assert_eq!(solver.springs().count(), 1);
}
