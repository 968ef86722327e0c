//! End-to-end scenarios and geometric properties of the territory core.

use territory::construct::{close_path, ConstructionInput, ConstructionStrategy};
use territory::game::{line_hit, self_intersects};
use territory::geometry::{centroid, polygon_area};
use territory::hull::convex_hull;
use territory::merge::{captured_indices, merge_candidate, MergePolicy};
use territory::zone::{Decay, ZoneSet, ZoneShape};
use territory::{
    CompletionPredicate, DeathCause, Direction, EnemyBehavior, EnemyPlacement, Game, GameConfig, GameEvent,
    GameStatus, Input, LevelDescriptor, Point, Rect, Rng,
};

fn p(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn square(x: f64, y: f64, size: f64) -> Vec<Point> {
    vec![p(x, y), p(x + size, y), p(x + size, y + size), p(x, y + size)]
}

fn random_polygon(rng: &mut Rng, n: usize) -> Vec<Point> {
    // star-shaped around (50, 50), so always simple
    let mut angles: Vec<f64> = (0..n).map(|_| rng.next_angle()).collect();
    angles.sort_by(|a, b| a.total_cmp(b));
    angles
        .into_iter()
        .map(|a| {
            let r = rng.next_range(10.0, 40.0);
            p(50.0 + a.cos() * r, 50.0 + a.sin() * r)
        })
        .collect()
}

fn walk(game: &mut Game, direction: Direction, ticks: usize) -> Vec<GameEvent> {
    let input = Input::toward(direction);
    (0..ticks).flat_map(|_| game.tick(&input).events).collect()
}

// ============================================================================
// Concrete scenarios
// ============================================================================

#[test]
fn square_trail_with_no_zones_becomes_one_zone() {
    let mut zones = ZoneSet::new();
    let path = square(0.0, 0.0, 10.0);
    let input = ConstructionInput {
        path: &path,
        exit_position: Some(p(0.0, 0.0)),
        zones: &zones,
        padding: 20.0,
    };
    let shape = close_path(ConstructionStrategy::ExactShapePlusFullZone, &input).unwrap();
    assert!((shape.area() - 100.0).abs() < 1e-9);

    merge_candidate(&mut zones, shape, MergePolicy::Append, None, 0);
    assert_eq!(zones.len(), 1);
}

#[test]
fn enemy_inside_closed_square_is_captured() {
    let shape = ZoneShape::polygon(square(0.0, 0.0, 10.0)).unwrap();
    let enemies = [p(5.0, 5.0), p(50.0, 50.0)];
    assert_eq!(captured_indices(&shape, &enemies), vec![0]);
}

#[test]
fn hull_merge_bridges_disjoint_squares() {
    let mut zones = ZoneSet::new();
    zones.insert(ZoneShape::polygon(square(0.0, 0.0, 10.0)).unwrap(), None);
    let candidate = ZoneShape::polygon(square(60.0, 5.0, 10.0)).unwrap();

    merge_candidate(&mut zones, candidate, MergePolicy::HullMerge, None, 0);

    assert_eq!(zones.len(), 1);
    let merged = zones.iter().next().map(|z| z.shape.clone()).unwrap();
    let vertices = merged.corners().len();
    assert!((6..=8).contains(&vertices), "{vertices} vertices");
    assert!(merged.area() >= 200.0);
    // the notch between the squares is now safe
    assert!(zones.is_safe(p(35.0, 7.0)));
}

#[test]
fn temporary_zone_expires_after_its_lifespan() {
    let t0 = 1_000;
    let mut zones = ZoneSet::new();
    zones.insert(
        ZoneShape::Rectangle(Rect::new(0.0, 0.0, 10.0, 10.0)),
        Some(Decay::new(t0, 8000, false)),
    );

    assert!(zones.expire(t0 + 7999).removed.is_empty());
    assert_eq!(zones.len(), 1);

    let report = zones.expire(t0 + 8001);
    assert_eq!(report.removed.len(), 1);
    assert!(!report.fatal);
    assert!(zones.is_empty());
}

#[test]
fn two_point_trail_is_rejected() {
    let zones = ZoneSet::with_initial(Rect::new(350.0, 250.0, 100.0, 100.0));
    let path = vec![p(0.0, 0.0), p(10.0, 0.0)];
    for &strategy in ConstructionStrategy::all() {
        let input = ConstructionInput {
            path: &path,
            exit_position: Some(path[0]),
            zones: &zones,
            padding: 20.0,
        };
        assert_eq!(close_path(strategy, &input), None, "{}", strategy.name());
    }
}

#[test]
fn enemy_near_trail_cuts_it() {
    let line = [p(0.0, 0.0), p(10.0, 0.0)];
    assert!(line_hit(&line, p(5.0, 1.5), 2.0));
    assert!(!line_hit(&line, p(5.0, 2.5), 2.0));
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn containment_ignores_rotation_and_reversal() {
    let mut rng = Rng::new(7);
    for _ in 0..50 {
        let poly = random_polygon(&mut rng, 7);
        let mut reversed = poly.clone();
        reversed.reverse();
        for _ in 0..20 {
            let q = p(rng.next_range(0.0, 100.0), rng.next_range(0.0, 100.0));
            let expected = territory::point_in_polygon(q, &poly);
            for shift in 1..poly.len() {
                let mut rotated = poly.clone();
                rotated.rotate_left(shift);
                assert_eq!(territory::point_in_polygon(q, &rotated), expected);
            }
            assert_eq!(territory::point_in_polygon(q, &reversed), expected);
        }
    }
}

#[test]
fn area_scales_and_translates() {
    let mut rng = Rng::new(11);
    for _ in 0..50 {
        let poly = random_polygon(&mut rng, 6);
        let area = polygon_area(&poly);
        assert!(area >= 0.0);

        let scaled: Vec<Point> = poly.iter().map(|q| p(q.x * 3.0, q.y * 3.0)).collect();
        assert!((polygon_area(&scaled) - 9.0 * area).abs() < 1e-6);

        let moved: Vec<Point> = poly.iter().map(|q| p(q.x + 123.0, q.y - 45.0)).collect();
        assert!((polygon_area(&moved) - area).abs() < 1e-6);
    }
}

#[test]
fn hull_is_idempotent_and_contains_its_input() {
    let mut rng = Rng::new(13);
    for _ in 0..50 {
        let points: Vec<Point> = (0..25)
            .map(|_| p(rng.next_range(0.0, 200.0), rng.next_range(0.0, 200.0)))
            .collect();
        let hull = convex_hull(&points);
        let again = convex_hull(&hull);
        assert_eq!(hull.len(), again.len());
        assert!(hull.iter().all(|v| again.iter().any(|w| v.approx_eq(*w, 1e-9))));

        let hull_area = polygon_area(&hull);
        for q in &points {
            // inside or on the boundary: adding the point can't grow the hull
            let mut with = hull.clone();
            with.push(*q);
            assert!(polygon_area(&convex_hull(&with)) <= hull_area + 1e-6);
        }
    }
}

#[test]
fn appending_zones_never_unsafes_a_point() {
    let mut rng = Rng::new(17);
    let mut zones = ZoneSet::with_initial(Rect::new(350.0, 250.0, 100.0, 100.0));
    let probes: Vec<Point> = (0..200)
        .map(|_| p(rng.next_range(0.0, 800.0), rng.next_range(0.0, 600.0)))
        .collect();

    for _ in 0..20 {
        let before: Vec<bool> = probes.iter().map(|q| zones.is_safe(*q)).collect();
        let x = rng.next_range(0.0, 700.0);
        let y = rng.next_range(0.0, 500.0);
        let shape = ZoneShape::polygon(square(x, y, 60.0)).unwrap();
        merge_candidate(&mut zones, shape, MergePolicy::Append, None, 0);

        for (q, was_safe) in probes.iter().zip(before) {
            if was_safe {
                assert!(zones.is_safe(*q));
            }
        }
    }
}

#[test]
fn centroid_is_captured_and_far_points_are_not() {
    let mut rng = Rng::new(19);
    for _ in 0..50 {
        let points: Vec<Point> = (0..12)
            .map(|_| p(rng.next_range(0.0, 100.0), rng.next_range(0.0, 100.0)))
            .collect();
        let poly = convex_hull(&points);
        let shape = ZoneShape::polygon(poly.clone()).unwrap();
        let b = shape.bounds();
        let positions = [centroid(&poly), p(b.max_x + 1.0, b.min_y), p(b.min_x, b.min_y - 1.0)];
        assert_eq!(captured_indices(&shape, &positions), vec![0]);
    }
}

#[test]
fn straight_trail_never_self_intersects() {
    for len in [6usize, 10, 100, 1000] {
        let line: Vec<Point> = (0..len).map(|i| p(0.0, -(i as f64) * 4.0)).collect();
        let head = line[len - 1];
        assert!(!self_intersects(&line, head, 2.0));
    }
}

// ============================================================================
// Whole-game runs
// ============================================================================

fn calm_config() -> GameConfig {
    GameConfig {
        enemy_speed_min: 0.01,
        enemy_speed_max: 0.01,
        ..Default::default()
    }
}

#[test]
fn long_straight_run_is_survivable() {
    let level = LevelDescriptor {
        enemy_count: 0,
        completion: CompletionPredicate::Coverage { percent: 99.0 },
        ..LevelDescriptor::new(90, "straight")
    };
    let mut game = Game::new(level, GameConfig::default(), 1).unwrap();
    walk(&mut game, Direction::Up, 300);
    assert_eq!(game.status(), GameStatus::Playing);
    assert!(game.player().is_drawing());
}

#[test]
fn loop_around_last_enemy_completes_elimination_level() {
    let level = LevelDescriptor {
        enemy_count: 1,
        enemy_placement: EnemyPlacement::At {
            points: vec![p(415.0, 200.0)],
        },
        enemy_behavior: EnemyBehavior::Drifter,
        completion: CompletionPredicate::EnemiesCleared,
        ..LevelDescriptor::new(91, "one to go")
    };
    let mut game = Game::new(level, calm_config(), 1).unwrap();

    let mut events = walk(&mut game, Direction::Up, 40);
    events.extend(walk(&mut game, Direction::Right, 10));
    events.extend(walk(&mut game, Direction::Down, 40));

    assert_eq!(game.status(), GameStatus::LevelComplete);
    assert!(game.enemies().is_empty());
    assert_eq!(game.items().len(), 1);
    assert!(events.iter().any(|e| matches!(e, GameEvent::EnemyCaptured { .. })));
    assert!(events.contains(&GameEvent::LevelCompleted { level: 91 }));
    assert!(game.score() > 0);
}

#[test]
fn expiring_tagged_zone_ends_the_game() {
    let level = LevelDescriptor {
        enemy_count: 0,
        merge: MergePolicy::TemporalTag {
            lifespan: 8000,
            kill_on_expire: true,
        },
        completion: CompletionPredicate::Coverage { percent: 99.0 },
        ..LevelDescriptor::new(92, "ticking")
    };
    let mut game = Game::new(level, GameConfig::default(), 1).unwrap();
    walk(&mut game, Direction::Up, 40);
    walk(&mut game, Direction::Right, 10);
    walk(&mut game, Direction::Down, 40);
    assert_eq!(game.zones().len(), 1);
    assert!(game.zones().iter().all(|z| z.is_temporary()));

    let idle = Input::default();
    for _ in 0..1000 {
        if game.tick(&idle).status != GameStatus::Playing {
            break;
        }
    }
    assert_eq!(game.status(), GameStatus::GameOver);
    assert_eq!(game.death_cause(), Some(DeathCause::ZoneExpired));
}

#[test]
fn frozen_after_game_over() {
    let level = LevelDescriptor {
        enemy_count: 0,
        completion: CompletionPredicate::Coverage { percent: 99.0 },
        time_limit_ms: Some(100),
        ..LevelDescriptor::new(93, "quick")
    };
    let mut game = Game::new(level, GameConfig::default(), 1).unwrap();
    let idle = Input::default();
    while game.tick(&idle).status == GameStatus::Playing {}

    let frozen = game.snapshot();
    for _ in 0..10 {
        let out = game.tick(&Input::toward(Direction::Up));
        assert!(out.events.is_empty());
    }
    assert_eq!(game.snapshot(), frozen);
}

#[test]
fn same_seed_and_inputs_replay_exactly() {
    let run = || {
        let level = territory::LevelTable::builtin().find(8).unwrap().clone();
        let mut game = Game::new(level, GameConfig::default(), 2024).unwrap();
        for i in 0..600 {
            let direction = Direction::ALL[(i / 50) % 4];
            game.tick(&Input::toward(direction));
        }
        game.snapshot()
    };
    assert_eq!(run(), run());
}
