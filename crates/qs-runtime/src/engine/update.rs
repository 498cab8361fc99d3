use super::ScriptEngine;

impl ScriptEngine {
    /// Per-frame tick. Polls the active wait and resumes the chain once it is
    /// satisfied; event-driven waits are left for the UI callbacks.
    pub fn update(&mut self, delta_ms: i64) {
        if !self.state.is_running || self.state.is_paused {
            return;
        }
        if self.state.pending_wait.is_none() {
            self.execute();
            return;
        }

        let satisfied = {
            let world = self.world.borrow();
            self.state
                .pending_wait
                .as_mut()
                .map(|wait| wait.poll(&*world, delta_ms))
                .unwrap_or(false)
        };
        if satisfied {
            self.resume_after_wait();
        }
    }

    pub fn pause(&mut self) {
        if self.state.is_running {
            self.state.is_paused = true;
        }
    }

    /// Clears the pause flag; the chain picks up on the next `update`.
    pub fn resume(&mut self) {
        self.state.is_paused = false;
    }
}
