use qs_core::ScriptError;

use crate::registry::{Arity, CommandContext, CommandRegistry, Flow};
use crate::wait::WaitReason;

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register("PlayMusic", Arity::exact(1), play_music);
    registry.register("StopMusic", Arity::exact(0), stop_music);
    registry.register("PlaySound", Arity::range(1, 3), play_sound);
    registry.register("FadeIn", Arity::exact(0), fade_in);
    registry.register("FadeOut", Arity::exact(0), fade_out);
    registry.register("ChangeMapColor", Arity::exact(3), change_map_color);
    registry.register("ChangeAsfColor", Arity::exact(3), change_asf_color);
    registry.register("BeginRain", Arity::range(0, 1), begin_rain);
    registry.register("EndRain", Arity::exact(0), end_rain);
    registry.register("ShowSnow", Arity::exact(1), show_snow);
}

fn play_music(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let file = ctx.text(0)?;
    ctx.world.play_music(&file);
    Ok(Flow::Continue)
}

fn stop_music(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    ctx.world.stop_music();
    Ok(Flow::Continue)
}

/// `PlaySound(file)` or the positional `PlaySound(file, x, y)`.
fn play_sound(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let file = ctx.text(0)?;
    let position = match ctx.param_count() {
        3 => Some((ctx.int(1)?, ctx.int(2)?)),
        1 => None,
        count => {
            return Err(ScriptError::new(
                "COMMAND_ARITY",
                format!("PlaySound takes 1 or 3 parameters, got {}.", count),
            ))
        }
    };
    ctx.world.play_sound(&file, position);
    Ok(Flow::Continue)
}

fn fade_in(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    ctx.world.fade_in();
    Ok(ctx.suspend(WaitReason::FadeIn))
}

fn fade_out(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    ctx.world.fade_out();
    Ok(ctx.suspend(WaitReason::FadeOut))
}

fn rgb(ctx: &CommandContext<'_>) -> Result<(i32, i32, i32), ScriptError> {
    Ok((
        ctx.int(0)?.clamp(0, 255),
        ctx.int(1)?.clamp(0, 255),
        ctx.int(2)?.clamp(0, 255),
    ))
}

fn change_map_color(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let (red, green, blue) = rgb(ctx)?;
    ctx.world.set_map_tint(red, green, blue);
    Ok(Flow::Continue)
}

fn change_asf_color(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let (red, green, blue) = rgb(ctx)?;
    ctx.world.set_sprite_tint(red, green, blue);
    Ok(Flow::Continue)
}

fn begin_rain(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let file = ctx.text_or(0, "")?;
    ctx.world.begin_rain(&file);
    Ok(Flow::Continue)
}

fn end_rain(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    ctx.world.end_rain();
    Ok(Flow::Continue)
}

fn show_snow(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let enabled = ctx.int(0)? != 0;
    ctx.world.set_snow(enabled);
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use crate::engine::test_support::harness;
    use crate::engine::ChainStatus;

    #[test]
    fn fades_suspend_until_the_world_reports_completion() {
        let mut h = harness(&[("main.txt", "FadeOut();\nLoadMap(\"map/b.map\");\nFadeIn();")]);
        {
            let mut world = h.world.borrow_mut();
            world.block("fadeOut");
            world.block("fadeIn");
        }
        h.engine.run_script("main.txt", None).expect("run should pass");
        assert_eq!(h.calls(), vec!["fade_out"]);
        assert_eq!(
            h.engine.state().pending_wait.as_ref().map(|wait| wait.name()),
            Some("fadeOut")
        );

        h.world.borrow_mut().unblock("fadeOut");
        h.engine.update(16);
        assert_eq!(h.calls(), vec!["fade_out", "load_map map/b.map", "fade_in"]);
        assert_eq!(h.engine.status(), ChainStatus::Suspended);

        h.world.borrow_mut().unblock("fadeIn");
        h.engine.update(16);
        assert_eq!(h.engine.status(), ChainStatus::Idle);
    }

    #[test]
    fn audio_and_weather_commands_are_fire_and_forget() {
        let mut h = harness(&[(
            "main.txt",
            "PlayMusic(\"town.mp3\");\nPlaySound(\"door.wav\");\nPlaySound(\"bell.wav\", 4, 5);\nChangeMapColor(300, 128, -5);\nChangeAsfColor(1, 2, 3);\nBeginRain(\"rain.wav\");\nEndRain();\nShowSnow(1);\nStopMusic();",
        )]);
        h.engine.run_script("main.txt", None).expect("run should pass");
        assert_eq!(
            h.calls(),
            vec![
                "play_music town.mp3",
                "play_sound door.wav",
                "play_sound bell.wav at 4 5",
                "map_tint 255 128 0",
                "sprite_tint 1 2 3",
                "begin_rain rain.wav",
                "end_rain",
                "snow true",
                "stop_music",
            ]
        );
    }

    #[test]
    fn play_sound_with_two_parameters_is_rejected() {
        let mut h = harness(&[("main.txt", "PlaySound(\"x.wav\", 1);")]);
        h.engine.run_script("main.txt", None).expect("run should pass");
        assert!(h.calls().is_empty());
        assert_eq!(h.diagnostic_codes(), vec!["COMMAND_ARITY"]);
    }
}
