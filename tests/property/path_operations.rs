//! Path operations against a plain `Vec` model.

use navigator::{
    Action, AnyDestination, Checkpoint, Destination, NavigationConfiguration, Navigator,
    RenderContext, Rendered,
};
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Step(u32);

impl Destination for Step {
    fn produce(&self, _context: &RenderContext) -> Rendered {
        Rendered::content(self.0)
    }
}

#[derive(Debug, Clone)]
enum Op {
    Push(u32),
    Pop,
    PopTo(usize),
    PopAll,
    Mark(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u32..50).prop_map(Op::Push),
        2 => Just(Op::Pop),
        1 => (0usize..8).prop_map(Op::PopTo),
        1 => Just(Op::PopAll),
        1 => (0u8..3).prop_map(Op::Mark),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap()
}

fn steps(navigator: &Navigator) -> Vec<u32> {
    navigator
        .path()
        .iter()
        .filter_map(|d| d.downcast_ref::<Step>().map(|s| s.0))
        .collect()
}

#[derive(Default)]
struct Model {
    path: Vec<u32>,
    checkpoints: HashMap<String, usize>,
}

impl Model {
    fn truncate(&mut self, len: usize) -> bool {
        if len >= self.path.len() {
            return false;
        }
        self.path.truncate(len);
        self.checkpoints.retain(|_, depth| *depth <= len);
        true
    }

    fn apply(&mut self, op: &Op) -> bool {
        match op {
            Op::Push(id) => {
                self.path.push(*id);
                true
            }
            Op::Pop => match self.path.len() {
                0 => false,
                len => self.truncate(len - 1),
            },
            Op::PopTo(index) => self.truncate(*index),
            Op::PopAll => self.truncate(0),
            Op::Mark(n) => {
                self.checkpoints
                    .insert(format!("mark-{}", n), self.path.len());
                false
            }
        }
    }
}

/// Each operation awaited on its own matches the model, including checkpoint pruning
#[test]
fn test_sequential_operations_match_model() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&prop::collection::vec(op_strategy(), 0..40), |ops| {
            let rt = runtime();
            rt.block_on(async {
                let navigator = Navigator::new(NavigationConfiguration::default());
                let mut model = Model::default();

                for op in &ops {
                    let expected = model.apply(op);
                    let changed = match op {
                        Op::Push(id) => navigator.push(Step(*id)).await.map(|_| true),
                        Op::Pop => navigator.pop().await,
                        Op::PopTo(index) => navigator.pop_to(*index).await,
                        Op::PopAll => navigator.pop_all().await,
                        Op::Mark(n) => {
                            navigator.establish_checkpoint(&Checkpoint::<()>::new(format!(
                                "mark-{}",
                                n
                            )));
                            Ok(false)
                        }
                    };
                    prop_assert_eq!(changed.unwrap(), expected);
                    prop_assert_eq!(steps(&navigator), model.path.clone());
                }

                for n in 0u8..3 {
                    let name = format!("mark-{}", n);
                    let checkpoint: Checkpoint = Checkpoint::new(name.clone());
                    prop_assert_eq!(
                        navigator.can_return_to_checkpoint(&checkpoint),
                        model.checkpoints.contains_key(&name)
                    );
                }
                Ok(())
            })
        })
        .unwrap();
}

/// Submitting the same operations as one batch ends at the same path
#[test]
fn test_single_batch_matches_model() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&prop::collection::vec(op_strategy(), 1..30), |ops| {
            let rt = runtime();
            rt.block_on(async {
                let navigator = Navigator::new(NavigationConfiguration::default());
                let mut model = Model::default();
                let mut actions = Vec::new();
                for op in &ops {
                    model.apply(op);
                    let action = match op {
                        Op::Push(id) => Action::Push(AnyDestination::new(Step(*id))),
                        Op::Pop => Action::Pop,
                        Op::PopTo(index) => Action::PopTo(*index),
                        Op::PopAll => Action::PopAll,
                        Op::Mark(n) => Action::custom("mark", {
                            let name = format!("mark-{}", n);
                            move |navigator: &Navigator| {
                                navigator.establish_checkpoint(&Checkpoint::<()>::new(
                                    name.clone(),
                                ));
                                navigator::Resolution::Immediately
                            }
                        }),
                    };
                    actions.push(action);
                }

                navigator.perform(actions).await.unwrap();
                prop_assert_eq!(steps(&navigator), model.path.clone());
                prop_assert_eq!(navigator.executor().pending(), 0);
                Ok(())
            })
        })
        .unwrap();
}
