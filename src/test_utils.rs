#[cfg(test)]
pub mod test_helpers {
    use crate::error::{Result, TwintailError};
    use crate::serve::runner::{CommandOutput, CommandRunner};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    enum Reply {
        Output(CommandOutput),
        SpawnError(std::io::ErrorKind),
    }

    /// Runner that replays queued replies in order and records every call.
    ///
    /// Once the queue is empty it answers with a failed "unexpected command".
    #[derive(Default)]
    pub struct ScriptedRunner {
        replies: Mutex<VecDeque<Reply>>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, output: CommandOutput) -> Self {
            self.replies.lock().unwrap().push_back(Reply::Output(output));
            self
        }

        pub fn fail_to_spawn(self, kind: std::io::ErrorKind) -> Self {
            self.replies.lock().unwrap().push_back(Reply::SpawnError(kind));
            self
        }

        pub fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, args: &[String]) -> Result<CommandOutput> {
            self.calls.lock().unwrap().push(args.to_vec());
            match self.replies.lock().unwrap().pop_front() {
                Some(Reply::Output(output)) => Ok(output),
                Some(Reply::SpawnError(kind)) => Err(TwintailError::Execution {
                    command: format!("tailscale {}", args.join(" ")),
                    source: std::io::Error::from(kind),
                }),
                None => Ok(CommandOutput::failed("unexpected command")),
            }
        }
    }
}
