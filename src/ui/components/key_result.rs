/// Generic result type for component key handling.
///
/// Components report back to their parent view in one of three ways: the
/// key was consumed outright, it was consumed and produced an event the
/// parent must act on, or it was not meant for this component at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Key was consumed, no event for parent to handle
  Handled,
  /// Key was consumed, here's an event for parent to process
  Event(T),
  /// Key was not consumed, parent should try next handler
  NotHandled,
}
