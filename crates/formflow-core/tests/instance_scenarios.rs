
use formflow_core::{FormFlowError, FormFlowInstance, StepStatus, TreeMerger};
use serde_json::json;
use test_support::{abc, ctx, loan};
use uuid::Uuid;

/// Tras un `complete`, el puntero es `None` sólo si el último step está
/// confirmado; si no, apunta al último de la historia.
fn assert_current_is_tip(instance: &FormFlowInstance) {
    let last = instance.history().last().expect("history never empty");
    match instance.current_step_instance_id() {
        None => assert!(last.is_completed(), "terminal flow must end with a completed step"),
        Some(id) => assert_eq!(id, last.id(), "current step must be the tip"),
    }
}

#[test]
fn abc_walkthrough_reaches_terminal_state() {
    let def = abc();
    let merger = TreeMerger::default();
    let ctx = ctx(&def, &merger);
    let mut inst = FormFlowInstance::start(&ctx).expect("start");
    assert_eq!(inst.history().len(), 1);
    let a = inst.current_step().unwrap().id();
    assert_eq!(inst.current_step().unwrap().step_key(), "a");

    let b = inst.complete(&ctx, a, json!({"x": 1})).unwrap().expect("b opened");
    assert_eq!(inst.history().len(), 2);
    assert_eq!(inst.history()[0].submission_data(), Some(&json!({"x": 1})));
    assert_eq!(inst.history()[1].step_key(), "b");
    assert!(inst.history()[1].submission_data().is_none());
    assert_current_is_tip(&inst);

    let c = inst.complete(&ctx, b, json!({"y": 2})).unwrap().expect("c opened");
    assert_eq!(inst.history().len(), 3);
    assert_eq!(inst.current_step().unwrap().id(), c);
    assert_current_is_tip(&inst);

    assert_eq!(inst.complete(&ctx, c, json!({})).unwrap(), None);
    assert_eq!(inst.history().len(), 3);
    assert!(inst.current_step_instance_id().is_none());
    assert!(inst.is_terminated());
    assert_current_is_tip(&inst);
    assert_eq!(inst.current_step().unwrap_err(), FormFlowError::NoCurrentStep);

    let orders: Vec<usize> = inst.history().iter().map(|s| s.order()).collect();
    assert_eq!(orders, vec![0, 1, 2]);
    assert_eq!(inst.submission_data_context(&merger), json!({"x": 1, "y": 2}));
}

#[test]
fn back_on_first_step_fails() {
    let def = abc();
    let merger = TreeMerger::default();
    let mut inst = FormFlowInstance::start(&ctx(&def, &merger)).unwrap();
    assert_eq!(inst.back().unwrap_err(), FormFlowError::NoPreviousStep);
}

#[test]
fn terminated_flow_rejects_operations() {
    let def = abc();
    let merger = TreeMerger::default();
    let ctx = ctx(&def, &merger);
    let mut inst = FormFlowInstance::start(&ctx).unwrap();
    for _ in 0..3 {
        let id = inst.current_step().unwrap().id();
        inst.complete(&ctx, id, json!({})).unwrap();
    }
    assert_eq!(inst.back().unwrap_err(), FormFlowError::NoCurrentStep);
    assert_eq!(inst.save_temporary(&ctx, json!({"z": 1})).unwrap_err(), FormFlowError::NoCurrentStep);
    assert_eq!(inst.complete(&ctx, Uuid::new_v4(), json!({})).unwrap_err(), FormFlowError::NoCurrentStep);
}

#[test]
fn stale_step_is_rejected_without_changes() {
    let def = abc();
    let merger = TreeMerger::default();
    let ctx = ctx(&def, &merger);
    let mut inst = FormFlowInstance::start(&ctx).unwrap();
    let a = inst.current_step().unwrap().id();
    let b = inst.complete(&ctx, a, json!({"x": 1})).unwrap().unwrap();

    let before = inst.clone();
    let err = inst.complete(&ctx, a, json!({"x": 2})).unwrap_err();
    assert_eq!(err, FormFlowError::StaleStep { expected: b, actual: a });
    assert_eq!(inst, before);

    // Después de `back`, el id de b queda obsoleto.
    inst.back().unwrap();
    let before = inst.clone();
    assert!(matches!(inst.complete(&ctx, b, json!({})), Err(FormFlowError::StaleStep { .. })));
    assert_eq!(inst, before);
}

#[test]
fn back_is_a_pure_pointer_move() {
    let def = abc();
    let merger = TreeMerger::default();
    let ctx = ctx(&def, &merger);
    let mut inst = FormFlowInstance::start(&ctx).unwrap();
    let a = inst.current_step().unwrap().id();
    let b = inst.complete(&ctx, a, json!({"x": 1})).unwrap().unwrap();
    inst.complete(&ctx, b, json!({"y": 2})).unwrap().unwrap();

    let history = inst.history().to_vec();
    assert_eq!(inst.back().unwrap().id(), b);
    assert_eq!(inst.back().unwrap().id(), a);
    assert_eq!(inst.history(), history.as_slice());
    assert_eq!(inst.current_step().unwrap().id(), a);
    // El contexto sigue cubriendo toda la historia.
    assert_eq!(inst.submission_data_context(&merger), json!({"x": 1, "y": 2}));
}

#[test]
fn resubmitting_identical_data_keeps_the_tail() {
    let def = abc();
    let merger = TreeMerger::default();
    let ctx = ctx(&def, &merger);
    let mut inst = FormFlowInstance::start(&ctx).unwrap();
    let a = inst.current_step().unwrap().id();
    let b = inst.complete(&ctx, a, json!({"x": 1})).unwrap().unwrap();
    let c = inst.complete(&ctx, b, json!({"y": 2, "list": [1, 2]})).unwrap().unwrap();
    let history = inst.history().to_vec();

    inst.back().unwrap();
    let next = inst.complete(&ctx, b, json!({"list": [1, 2], "y": 2})).unwrap();
    assert_eq!(next, Some(c), "existing step must be reused");
    assert_eq!(inst.history(), history.as_slice());

    // Dos pasos atrás y reanudar hacia adelante.
    inst.back().unwrap();
    inst.back().unwrap();
    assert_eq!(inst.complete(&ctx, a, json!({"x": 1})).unwrap(), Some(b));
    assert_eq!(inst.complete(&ctx, b, json!({"y": 2, "list": [1, 2]})).unwrap(), Some(c));
    assert_eq!(inst.history(), history.as_slice());
    assert_current_is_tip(&inst);
}

#[test]
fn resubmitting_different_data_invalidates_the_tail() {
    let def = abc();
    let merger = TreeMerger::default();
    let ctx = ctx(&def, &merger);
    let mut inst = FormFlowInstance::start(&ctx).unwrap();
    let a = inst.current_step().unwrap().id();
    let b = inst.complete(&ctx, a, json!({"x": 1})).unwrap().unwrap();
    let c = inst.complete(&ctx, b, json!({"y": 2})).unwrap().unwrap();
    inst.save_temporary(&ctx, json!({"z": 3})).unwrap();

    inst.back().unwrap();
    inst.back().unwrap();
    let new_b = inst.complete(&ctx, a, json!({"x": 99})).unwrap().unwrap();
    assert_ne!(new_b, b);
    assert_eq!(inst.history().len(), 2);
    assert!(inst.step_instance(b).is_none());
    assert!(inst.step_instance(c).is_none());
    assert!(inst.history()[1].submission_data().is_none());
    assert_eq!(inst.submission_data_context(&merger), json!({"x": 99}));
    assert_current_is_tip(&inst);
}

#[test]
fn changed_answer_reroutes_the_flow() {
    let def = loan();
    let merger = TreeMerger::default();
    let ctx = ctx(&def, &merger);
    let mut inst = FormFlowInstance::start(&ctx).unwrap();
    let applicant = inst.current_step().unwrap().id();

    let employment = inst.complete(&ctx, applicant, json!({"adult": true})).unwrap().unwrap();
    assert_eq!(inst.step_instance(employment).unwrap().step_key(), "employment");
    inst.complete(&ctx, employment, json!({"employer": "ACME"})).unwrap().unwrap();
    assert_eq!(inst.history().len(), 3);

    inst.back().unwrap();
    inst.back().unwrap();
    let guardian = inst.complete(&ctx, applicant, json!({"adult": false})).unwrap().unwrap();
    let keys: Vec<&str> = inst.history().iter().map(|s| s.step_key()).collect();
    assert_eq!(keys, vec!["applicant", "guardian"]);
    assert_eq!(inst.current_step().unwrap().id(), guardian);
    assert_eq!(inst.submission_data_context(&merger), json!({"adult": false}));
}

#[test]
fn drafts_do_not_advance_but_join_the_context() {
    let def = abc();
    let merger = TreeMerger::default();
    let ctx = ctx(&def, &merger);
    let mut inst = FormFlowInstance::start(&ctx).unwrap();
    let a = inst.current_step().unwrap().id();
    let b = inst.complete(&ctx, a, json!({"x": 1})).unwrap().unwrap();

    inst.save_temporary(&ctx, json!({"y": "partial"})).unwrap();
    let current = inst.current_step().unwrap();
    assert_eq!(current.id(), b);
    assert!(current.is_draft());
    assert_eq!(current.status(), StepStatus::Draft);
    assert_eq!(inst.history().len(), 2);
    assert_eq!(inst.submission_data_context(&merger), json!({"x": 1, "y": "partial"}));

    inst.complete(&ctx, b, json!({"y": "final"})).unwrap().unwrap();
    let b_step = inst.step_instance(b).unwrap();
    assert!(!b_step.is_draft());
    assert_eq!(b_step.status(), StepStatus::Completed);
}

#[test]
fn tail_drafts_survive_identical_resubmission() {
    let def = abc();
    let merger = TreeMerger::default();
    let ctx = ctx(&def, &merger);
    let mut inst = FormFlowInstance::start(&ctx).unwrap();
    let a = inst.current_step().unwrap().id();
    let b = inst.complete(&ctx, a, json!({"x": 1})).unwrap().unwrap();
    inst.save_temporary(&ctx, json!({"y": "draft"})).unwrap();

    inst.back().unwrap();
    assert_eq!(inst.complete(&ctx, a, json!({"x": 1})).unwrap(), Some(b));
    let b_step = inst.current_step().unwrap();
    assert!(b_step.is_draft());
    assert_eq!(b_step.submission_data(), Some(&json!({"y": "draft"})));
}

#[test]
fn tail_drafts_are_discarded_on_divergence() {
    let def = abc();
    let merger = TreeMerger::default();
    let ctx = ctx(&def, &merger);
    let mut inst = FormFlowInstance::start(&ctx).unwrap();
    let a = inst.current_step().unwrap().id();
    inst.complete(&ctx, a, json!({"x": 1, "nested": {"k": 1}})).unwrap().unwrap();
    inst.save_temporary(&ctx, json!({"top": "draft", "nested": {"k": 2}})).unwrap();

    inst.back().unwrap();
    inst.complete(&ctx, a, json!({"x": 2, "nested": {"k": 1}})).unwrap().unwrap();
    assert_eq!(inst.history().len(), 2);
    assert!(inst.current_step().unwrap().submission_data().is_none());
    assert_eq!(inst.submission_data_context(&merger), json!({"x": 2, "nested": {"k": 1}}));
}

#[test]
fn divergent_draft_behind_the_tip_invalidates_the_tail() {
    let def = abc();
    let merger = TreeMerger::default();
    let ctx = ctx(&def, &merger);
    let mut inst = FormFlowInstance::start(&ctx).unwrap();
    let a = inst.current_step().unwrap().id();
    let b = inst.complete(&ctx, a, json!({"x": 1})).unwrap().unwrap();
    inst.complete(&ctx, b, json!({"y": 2})).unwrap().unwrap();

    inst.back().unwrap();
    inst.save_temporary(&ctx, json!({"y": 2})).unwrap();
    assert_eq!(inst.history().len(), 3, "identical draft keeps the tail");

    inst.save_temporary(&ctx, json!({"y": 3})).unwrap();
    assert_eq!(inst.history().len(), 2);
    assert_eq!(inst.current_step().unwrap().id(), b);
    assert!(inst.current_step().unwrap().is_draft());
}

#[test]
fn merged_context_later_values_override() {
    let def = abc();
    let merger = TreeMerger::default();
    let ctx = ctx(&def, &merger);
    let mut inst = FormFlowInstance::start(&ctx).unwrap();
    let a = inst.current_step().unwrap().id();
    let b = inst.complete(&ctx, a, json!({"a": 1})).unwrap().unwrap();
    inst.complete(&ctx, b, json!({"a": 2})).unwrap().unwrap();
    assert_eq!(inst.submission_data_context(&merger), json!({"a": 2}));
}

#[test]
fn merged_context_merges_arrays_by_code() {
    let def = abc();
    let merger = TreeMerger::default();
    let ctx = ctx(&def, &merger);
    let mut inst = FormFlowInstance::start(&ctx).unwrap();
    let a = inst.current_step().unwrap().id();
    let b = inst.complete(&ctx, a, json!({"items": [{"code": 1}]})).unwrap().unwrap();
    inst.complete(&ctx, b, json!({"items": [{"code": 1, "extra": "x"}, {"code": 2}]})).unwrap().unwrap();
    assert_eq!(inst.submission_data_context(&merger),
               json!({"items": [{"code": 1, "extra": "x"}, {"code": 2}]}));
}
