/// Outcome of offering a key to a component.
///
/// Views chain components with `or_else`: the first one that doesn't return
/// `NotHandled` wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Key was consumed, nothing for the parent to do
  Handled,
  /// Key was consumed and produced an event for the parent
  Event(T),
  /// Key was not consumed, parent should try next handler
  NotHandled,
}
