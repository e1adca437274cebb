use tempo_core::Outcome;

use crate::executor::Executor;

/// Result of racing two tasks: the winner's outcome plus a handle to the
/// still-running loser
///
/// "Winner" means the branch whose completion the executor observed first.
/// The loser keeps running; the caller decides whether to join or cancel it.
pub enum RaceWinner<E, A, B>
where
    E: Executor,
    A: Send + 'static,
    B: Send + 'static,
{
    /// The left branch finished first
    Left(Outcome<A>, E::Handle<B>),
    /// The right branch finished first
    Right(E::Handle<A>, Outcome<B>),
}
