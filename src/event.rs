use crate::field::FieldPart;

/// A complete message, dispatched on a blank line or at the end of the stream.
///
/// Fields that were never set in the message are empty strings, and `retry` is
/// `None`. Nothing carries over from one message to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Event {
    pub id: String,
    pub event: String,
    pub data: String,
    pub retry: Option<i64>,
}

/// Folds field parts into messages.
#[derive(Debug, Default)]
pub struct EventBuilder {
    current: Event,
}

impl EventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field to the message being built, returning the message when the
    /// part is a blank line.
    pub fn apply(&mut self, part: FieldPart) -> Option<Event> {
        match part {
            FieldPart::Empty => return Some(self.finish()),

            // Multiple data lines join with a single LF. Rather than appending a
            // LF per line and trimming on dispatch, push it before MORE data.
            FieldPart::Data(value) => {
                let data = &mut self.current.data;
                if data.is_empty() {
                    *data = value;
                } else {
                    data.reserve(value.len() + 1);
                    data.push('\n');
                    data.push_str(&value);
                }
            }

            FieldPart::Event(value) => self.current.event = value,
            FieldPart::Id(value) => self.current.id = value,
            FieldPart::Retry(ms) => self.current.retry = Some(ms),
        }

        None
    }

    /// Takes the message built so far, leaving a fresh one in its place.
    pub fn finish(&mut self) -> Event {
        let event = std::mem::take(&mut self.current);
        tracing::trace!(
            event = %event.event,
            id = %event.id,
            data_len = event.data.len(),
            "dispatching message"
        );
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(s: &str) -> FieldPart {
        FieldPart::Data(s.to_owned())
    }

    #[test]
    fn data_lines_join_with_lf() {
        let mut b = EventBuilder::new();
        assert!(b.apply(data("a")).is_none());
        assert!(b.apply(data("b")).is_none());

        let ev = b.apply(FieldPart::Empty).expect("dispatch");
        assert_eq!(ev.data, "a\nb");
        assert_eq!(ev.event, "");
        assert_eq!(ev.id, "");
        assert_eq!(ev.retry, None);
    }

    #[test]
    fn empty_data_values_add_no_lf() {
        // An empty value leaves the buffer empty, so the next value is not
        // preceded by a LF.
        let mut b = EventBuilder::new();
        b.apply(data(""));
        b.apply(data(""));
        assert_eq!(b.finish().data, "");

        b.apply(data(""));
        b.apply(data("x"));
        assert_eq!(b.finish().data, "x");
    }

    #[test]
    fn last_write_wins() {
        let mut b = EventBuilder::new();
        b.apply(FieldPart::Event("one".into()));
        b.apply(FieldPart::Event("two".into()));
        b.apply(FieldPart::Id("1".into()));
        b.apply(FieldPart::Id("2".into()));
        b.apply(FieldPart::Retry(10));
        b.apply(FieldPart::Retry(-20));

        let ev = b.apply(FieldPart::Empty).expect("dispatch");
        assert_eq!(
            ev,
            Event {
                id: "2".into(),
                event: "two".into(),
                data: String::new(),
                retry: Some(-20),
            }
        );
    }

    #[test]
    fn dispatch_resets_every_field() {
        let mut b = EventBuilder::new();
        b.apply(FieldPart::Id("1".into()));
        b.apply(FieldPart::Event("add".into()));
        b.apply(FieldPart::Retry(5));
        b.apply(data("x"));
        b.apply(FieldPart::Empty).expect("dispatch");

        assert_eq!(b.apply(FieldPart::Empty), Some(Event::default()));
        assert_eq!(b.finish(), Event::default());
    }

    #[test]
    fn dispatched_message_is_not_aliased() {
        let mut b = EventBuilder::new();
        b.apply(data("first"));
        let first = b.apply(FieldPart::Empty).expect("dispatch");

        b.apply(data("second"));
        assert_eq!(first.data, "first");
        assert_eq!(b.finish().data, "second");
    }
}
