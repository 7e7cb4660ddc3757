//! Tests for HierarchyBuilder

use rstest::rstest;

use teamtree::domain::{HierarchyBuilder, HierarchyForest, Participant, Role};
use teamtree::util::testing;

fn multiplier(id: &str, leader: Option<&str>) -> Participant {
    let p = Participant::new(id, format!("Name {id}"), Role::Multiplier);
    match leader {
        Some(leader) => p.with_leader(leader),
        None => p,
    }
}

fn follower(id: &str, leader: &str) -> Participant {
    Participant::new(id, format!("Name {id}"), Role::Follower).with_leader(leader)
}

/// Flatten the structure into comparable (id, children, followers) rows.
fn shape(forest: &HierarchyForest) -> Vec<(String, Vec<String>, Vec<String>)> {
    forest
        .iter()
        .map(|(_, node)| {
            (
                node.id().to_string(),
                forest
                    .children_of(node.id())
                    .into_iter()
                    .map(String::from)
                    .collect(),
                forest
                    .followers_of(node.id())
                    .into_iter()
                    .map(String::from)
                    .collect(),
            )
        })
        .collect()
}

#[test]
fn given_root_with_multiplier_and_follower_when_building_then_attaches_both() {
    testing::init_test_setup();
    // Arrange
    let input = vec![
        multiplier("A", None),
        multiplier("B", Some("A")),
        follower("C", "A"),
    ];

    // Act
    let (forest, report) = HierarchyBuilder::new().build(&input);

    // Assert
    assert_eq!(forest.root_ids(), vec!["A"]);
    assert_eq!(forest.children_of("A"), vec!["B"]);
    assert_eq!(forest.followers_of("A"), vec!["C"]);
    assert!(forest.children_of("B").is_empty());
    assert!(forest.followers_of("B").is_empty());
    assert!(report.orphan_followers.is_empty());
}

#[test]
fn given_leader_referencing_nobody_when_building_then_becomes_root() {
    let input = vec![multiplier("X", Some("ghost-id"))];

    let (forest, _) = HierarchyBuilder::new().build(&input);

    assert_eq!(forest.root_ids(), vec!["X"]);
}

#[rstest]
#[case::follower_leader(Role::Follower)]
#[case::admin_leader(Role::Admin)]
#[case::link_leader(Role::Link)]
fn given_leader_with_non_multiplier_role_when_building_then_multiplier_is_root(
    #[case] leader_role: Role,
) {
    let input = vec![
        Participant::new("L", "Leader", leader_role),
        multiplier("M", Some("L")),
    ];

    let (forest, _) = HierarchyBuilder::new().build(&input);

    assert_eq!(forest.root_ids(), vec!["M"]);
    assert!(!forest.contains("L"));
}

#[test]
fn given_every_multiplier_with_valid_leader_when_building_then_has_exactly_one_parent() {
    let input = vec![
        multiplier("r1", None),
        multiplier("r2", Some("")),
        multiplier("a", Some("r1")),
        multiplier("b", Some("r1")),
        multiplier("c", Some("a")),
        multiplier("d", Some("r2")),
    ];

    let (forest, _) = HierarchyBuilder::new().build(&input);

    assert_eq!(forest.root_ids(), vec!["r1", "r2"]);
    for id in ["a", "b", "c", "d"] {
        let parents: Vec<&str> = ["r1", "r2", "a", "b", "c", "d"]
            .into_iter()
            .filter(|p| forest.children_of(p).contains(&id))
            .collect();
        assert_eq!(parents.len(), 1, "{id} has parents {parents:?}");
        assert!(!forest.root_ids().contains(&id));
    }
    assert_eq!(forest.len(), 6);
}

#[test]
fn given_followers_when_building_then_each_sits_with_its_leader_only() {
    let input = vec![
        multiplier("a", None),
        multiplier("b", Some("a")),
        follower("f1", "a"),
        follower("f2", "b"),
        follower("f3", "b"),
        follower("lost", "nobody"),
        follower("leaderless", ""),
    ];

    let (forest, report) = HierarchyBuilder::new().build(&input);

    assert_eq!(forest.followers_of("a"), vec!["f1"]);
    assert_eq!(forest.followers_of("b"), vec!["f2", "f3"]);
    assert_eq!(forest.follower_count(), 3);
    assert_eq!(report.orphan_followers, vec!["lost", "leaderless"]);
}

#[test]
fn given_same_input_when_building_twice_then_structure_is_identical() {
    let input = vec![
        multiplier("a", None),
        multiplier("b", Some("a")),
        multiplier("c", Some("a")),
        multiplier("d", Some("c")),
        follower("f", "d"),
        multiplier("e", Some("ghost")),
    ];
    let builder = HierarchyBuilder::new().exclude(Some("e"));

    let (first, first_report) = builder.build(&input);
    let (second, second_report) = builder.build(&input);

    assert_eq!(shape(&first), shape(&second));
    assert_eq!(first.root_ids(), second.root_ids());
    assert_eq!(first_report, second_report);
}

#[test]
fn given_excluded_multiplier_when_building_then_recruits_become_roots() {
    let input = vec![
        multiplier("admin", None),
        multiplier("a", Some("admin")),
        multiplier("b", Some("admin")),
        multiplier("c", Some("a")),
        follower("f", "admin"),
    ];

    let (forest, report) = HierarchyBuilder::new()
        .exclude(Some("admin"))
        .build(&input);

    assert!(report.excluded);
    assert!(!forest.contains("admin"));
    assert_eq!(forest.root_ids(), vec!["a", "b"]);
    assert_eq!(forest.children_of("a"), vec!["c"]);
    assert_eq!(report.orphan_followers, vec!["f"]);
}

#[test]
fn given_excluded_follower_when_building_then_not_attached() {
    let input = vec![multiplier("a", None), follower("me", "a"), follower("f", "a")];

    let (forest, report) = HierarchyBuilder::new().exclude(Some("me")).build(&input);

    assert!(report.excluded);
    assert_eq!(forest.followers_of("a"), vec!["f"]);
}

#[test]
fn given_leader_cycle_when_building_then_terminates_and_places_everyone_once() {
    // a -> b -> c -> a, plus an unrelated root
    let input = vec![
        multiplier("root", None),
        multiplier("a", Some("c")),
        multiplier("b", Some("a")),
        multiplier("c", Some("b")),
        follower("f", "b"),
    ];

    let (forest, report) = HierarchyBuilder::new().build(&input);

    assert_eq!(forest.len(), 4);
    assert_eq!(forest.root_ids(), vec!["root", "a"]);
    assert_eq!(report.promoted_cycle_roots, vec!["a"]);
    assert_eq!(forest.children_of("a"), vec!["b"]);
    assert_eq!(forest.children_of("b"), vec!["c"]);
    assert!(forest.children_of("c").is_empty());
    assert_eq!(forest.followers_of("b"), vec!["f"]);
}

#[test]
fn given_deep_chain_when_building_then_depths_increase_by_one() {
    let mut input = vec![multiplier("m0", None)];
    for i in 1..500 {
        input.push(multiplier(&format!("m{i}"), Some(&format!("m{}", i - 1))));
    }

    let (forest, _) = HierarchyBuilder::new().build(&input);

    assert_eq!(forest.depth(), 500);
    assert_eq!(forest.leaf_nodes(), vec!["m499"]);
}

#[test]
fn given_recruits_listed_before_their_cycle_when_building_then_keep_their_leaders() {
    // d -> c -> a, while a and b lead each other
    let input = vec![
        multiplier("d", Some("c")),
        multiplier("c", Some("a")),
        multiplier("b", Some("a")),
        multiplier("a", Some("b")),
        follower("f", "c"),
    ];

    let (forest, report) = HierarchyBuilder::new().build(&input);

    assert_eq!(forest.root_ids(), vec!["b"]);
    assert_eq!(report.promoted_cycle_roots, vec!["b"]);
    assert_eq!(forest.children_of("b"), vec!["a"]);
    assert_eq!(forest.children_of("a"), vec!["c"]);
    assert_eq!(forest.children_of("c"), vec!["d"]);
    assert_eq!(forest.followers_of("c"), vec!["f"]);
    assert_eq!(forest.len(), 4);
}

#[test]
fn given_two_separate_cycles_when_building_then_promotes_one_member_each() {
    let input = vec![
        multiplier("x", Some("y")),
        multiplier("y", Some("x")),
        multiplier("hang", Some("q")),
        multiplier("p", Some("q")),
        multiplier("q", Some("p")),
    ];

    let (forest, report) = HierarchyBuilder::new().build(&input);

    assert_eq!(report.promoted_cycle_roots, vec!["x", "p"]);
    assert_eq!(forest.root_ids(), vec!["x", "p"]);
    assert_eq!(forest.children_of("q"), vec!["hang"]);
    assert_eq!(forest.len(), 5);
}
