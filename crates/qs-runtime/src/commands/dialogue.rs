use std::collections::VecDeque;

use qs_core::ScriptError;

use crate::registry::{Arity, CommandContext, CommandRegistry, Flow};
use crate::wait::WaitReason;

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register("Say", Arity::range(1, 2), say);
    registry.register("Talk", Arity::range(1, 2), talk);
    registry.register("Message", Arity::exact(1), message);
    registry.register("ShowMessage", Arity::exact(1), message);
    registry.register("Choose", Arity::exact(4), choose);
    registry.register("Select", Arity::exact(4), choose);
    registry.register("ChooseMultiple", Arity::at_least(4), choose_multiple);
}

fn say(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let text = ctx.text(0)?;
    let portrait = ctx.int_or(1, 0)?;
    ctx.world.show_dialog(&text, portrait);
    Ok(ctx.suspend(WaitReason::Input {
        result_variable: None,
    }))
}

/// `Talk(start[, end])` shows talk-table lines `start..=end` one dialog at a
/// time; the chain stays parked until the last one is closed.
fn talk(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let start = ctx.int(0)?;
    let end = ctx.int_or(1, start)?;
    let mut lines = VecDeque::from(ctx.world.talk_lines(start, end));
    let Some(first) = lines.pop_front() else {
        return Err(ScriptError::new(
            "COMMAND_TALK_EMPTY",
            format!("No talk lines in {}..={}.", start, end),
        ));
    };
    ctx.world.show_dialog(&first.text, first.portrait_index);
    Ok(ctx.suspend(WaitReason::TalkQueue { remaining: lines }))
}

fn message(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let text = ctx.text(0)?;
    ctx.world.show_message(&text);
    Ok(Flow::Continue)
}

/// `Choose(message, optionA, optionB, $result)`; the picked index lands in
/// `$result` through `on_selection_made`.
fn choose(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let result = ctx.variable(3)?.to_string();
    let prompt = ctx.text(0)?;
    let option_a = ctx.text(1)?;
    let option_b = ctx.text(2)?;
    ctx.world.show_selection(&prompt, &option_a, &option_b);
    Ok(ctx.suspend(WaitReason::Input {
        result_variable: Some(result),
    }))
}

/// `ChooseMultiple(columns, $result, message, option...)`.
fn choose_multiple(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let columns = ctx.int(0)?.max(1);
    let result = ctx.variable(1)?.to_string();
    let prompt = ctx.text(2)?;
    let options = (3..ctx.param_count())
        .map(|index| ctx.text(index))
        .collect::<Result<Vec<_>, _>>()?;
    ctx.world.show_multi_selection(columns, &prompt, &options);
    Ok(ctx.suspend(WaitReason::Input {
        result_variable: Some(result),
    }))
}

#[cfg(test)]
mod tests {
    use crate::engine::test_support::{harness, harness_with};
    use crate::engine::{ChainStatus, EngineOptions};
    use crate::recording::RecordingWorld;

    #[test]
    fn say_waits_for_the_dialog_to_close() {
        let mut h = harness(&[("main.txt", "Say(\"Hello $name\", 3);\nMessage(\"done\");")]);
        h.set_var("name", 7);
        h.engine.run_script("main.txt", None).expect("run should pass");
        assert_eq!(h.calls(), vec!["dialog 3 Hello 7"]);
        assert_eq!(h.engine.status(), ChainStatus::Suspended);

        h.engine.update(1000);
        assert_eq!(h.engine.status(), ChainStatus::Suspended);

        h.engine.on_dialog_closed().expect("close should pass");
        assert_eq!(h.calls(), vec!["dialog 3 Hello 7", "message done"]);
        assert_eq!(h.engine.status(), ChainStatus::Idle);
    }

    #[test]
    fn talk_shows_each_line_in_turn_as_one_suspension() {
        let world = RecordingWorld::default()
            .with_talk(10, "first", 1)
            .with_talk(11, "second", 2)
            .with_talk(12, "third", 1)
            .with_talk(13, "not included", 1);
        let mut h = harness_with(
            &[("main.txt", "Talk(10, 12);\nMessage(\"after\");")],
            world,
            EngineOptions::default(),
        );
        h.engine.run_script("main.txt", None).expect("run should pass");
        assert_eq!(h.calls(), vec!["dialog 1 first"]);
        assert_eq!(h.engine.state().talk_queue().len(), 2);

        h.engine.on_dialog_closed().expect("close should pass");
        assert_eq!(h.engine.state().talk_queue().len(), 1);
        h.engine.on_dialog_closed().expect("close should pass");
        assert_eq!(h.engine.status(), ChainStatus::Suspended);
        h.engine.on_dialog_closed().expect("close should pass");
        assert_eq!(
            h.calls(),
            vec!["dialog 1 first", "dialog 2 second", "dialog 1 third", "message after"]
        );
        assert!(!h.engine.is_running());
    }

    #[test]
    fn talk_without_lines_is_reported_and_skipped() {
        let mut h = harness(&[("main.txt", "Talk(99);\nMessage(\"after\");")]);
        h.engine.run_script("main.txt", None).expect("run should pass");
        assert_eq!(h.calls(), vec!["message after"]);
        assert_eq!(h.diagnostic_codes(), vec!["COMMAND_TALK_EMPTY"]);
    }

    #[test]
    fn choose_binds_the_selection_and_resumes_one_line_later() {
        let mut h = harness(&[(
            "main.txt",
            "Choose(\"Help?\", \"Yes\", \"No\", $result);\nMessage(\"picked $result\");\nMessage(\"end\");",
        )]);
        h.engine.run_script("main.txt", None).expect("run should pass");
        assert_eq!(h.calls(), vec!["selection Help? [Yes|No]"]);
        assert_eq!(h.engine.state().current_line, 0);

        let closed = h.engine.on_dialog_closed();
        assert_eq!(
            closed.expect_err("dialog close must not answer a selection").code,
            "ENGINE_NO_PENDING_DIALOG"
        );

        h.engine.on_selection_made(1).expect("selection should pass");
        assert_eq!(h.var("result"), 1);
        assert_eq!(
            h.calls(),
            vec!["selection Help? [Yes|No]", "message picked 1", "message end"]
        );
    }

    #[test]
    fn selection_without_pending_choice_is_an_error() {
        let mut h = harness(&[("main.txt", "Say(\"hi\");")]);
        h.engine.run_script("main.txt", None).expect("run should pass");
        let error = h.engine.on_selection_made(0).expect_err("no choice pending");
        assert_eq!(error.code, "ENGINE_NO_PENDING_SELECTION");
        assert_eq!(h.engine.status(), ChainStatus::Suspended);
    }

    #[test]
    fn choose_multiple_lists_every_option() {
        let mut h = harness(&[(
            "main.txt",
            "ChooseMultiple(2, $pick, \"Where to?\", \"Inn\", \"Shop\", \"Gate\");",
        )]);
        h.engine.run_script("main.txt", None).expect("run should pass");
        assert_eq!(h.calls(), vec!["multi_selection 2 Where to? [Inn|Shop|Gate]"]);
        h.engine.on_selection_made(2).expect("selection should pass");
        assert_eq!(h.var("pick"), 2);
        assert!(!h.engine.is_running());
    }
}
