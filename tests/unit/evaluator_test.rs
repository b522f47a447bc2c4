//! Unit tests for badge evaluation over a realistic badge tree.

use chrono::Utc;
use scoutbadge::badges::evaluator::{evaluate_badge, index_progress, ProgressIndex};
use scoutbadge::badges::{
    BadgeCategory, BadgeCompletionRule, BadgeDefinition, BadgeModule, BadgeRequirement,
    BadgeSection, BadgeStructure, MemberRequirementProgress, ModuleStructure,
};
use uuid::Uuid;

/// Two-module badge: "Skills" needs all three, "Projects" needs any 2 of 4.
fn hobbies_badge() -> BadgeStructure {
    let badge = BadgeDefinition::new("Hobbies", BadgeSection::All, BadgeCategory::Activity);

    let skills = BadgeModule::new(badge.id, "Skills", 1);
    let skill_reqs = (1..=3)
        .map(|i| BadgeRequirement::new(&skills, &format!("Skill {}", i), i))
        .collect();

    let projects = BadgeModule::new(badge.id, "Projects", 2).x_of_n(2);
    let project_reqs = (1..=4)
        .map(|i| BadgeRequirement::new(&projects, &format!("Project {}", i), i).times(2))
        .collect();

    BadgeStructure {
        badge,
        modules: vec![
            ModuleStructure {
                module: skills,
                requirements: skill_reqs,
            },
            ModuleStructure {
                module: projects,
                requirements: project_reqs,
            },
        ],
    }
}

fn done(req: &BadgeRequirement, count: u32) -> MemberRequirementProgress {
    MemberRequirementProgress {
        id: Uuid::new_v4(),
        member_id: Uuid::nil(),
        requirement_id: req.id,
        badge_id: req.badge_id,
        completion_count: count,
        completed: count >= req.completions_needed(),
        completed_date: None,
        updated_at: Utc::now(),
    }
}

#[test]
fn test_nothing_recorded() {
    let badge = hobbies_badge();
    let eval = evaluate_badge(&badge, &ProgressIndex::new(), None);

    assert!(!eval.computed_complete);
    assert!(eval.structure_complete);
    assert_eq!(eval.requirements_started, 0);
    assert_eq!(eval.progress, 0.0);
    assert!(eval.effective_status().is_none());
}

#[test]
fn test_both_modules_needed() {
    let badge = hobbies_badge();
    let skills = &badge.modules[0].requirements;
    let projects = &badge.modules[1].requirements;

    // Skills complete, projects only half done
    let mut rows: Vec<_> = skills.iter().map(|r| done(r, 1)).collect();
    rows.push(done(&projects[0], 2));
    rows.push(done(&projects[1], 1));
    let eval = evaluate_badge(&badge, &index_progress(rows.clone()), None);
    assert!(!eval.computed_complete);
    assert!(eval.modules[0].satisfied);
    assert!(!eval.modules[1].satisfied);
    assert_eq!(eval.modules[1].satisfied_count, 1);

    // A second project completes the x-of-n module and the badge
    rows.push(done(&projects[3], 2));
    let eval = evaluate_badge(&badge, &index_progress(rows), None);
    assert!(eval.computed_complete);
    assert_eq!(eval.progress, 1.0);
}

#[test]
fn test_one_module_rule_accepts_either_path() {
    let mut badge = hobbies_badge();
    badge.badge.completion_rule = BadgeCompletionRule::OneModule;
    let projects = &badge.modules[1].requirements;

    let rows = vec![done(&projects[1], 2), done(&projects[2], 2)];
    let eval = evaluate_badge(&badge, &index_progress(rows), None);
    assert!(eval.computed_complete);
    assert!(!eval.modules[0].satisfied);
}

#[test]
fn test_badge_without_modules_is_incomplete() {
    let badge = BadgeStructure {
        badge: BadgeDefinition::new("Empty", BadgeSection::All, BadgeCategory::Activity),
        modules: vec![],
    };
    let eval = evaluate_badge(&badge, &ProgressIndex::new(), None);
    assert!(!eval.computed_complete);
    assert!(!eval.structure_complete);
}
