/// A structure to manage progress reporting for the flashing procedure.
///
/// Stores a handler closure which is called for every event that happens
/// while erasing or programming. A whole flashing session may run on a
/// background worker while a foreground observer consumes these events.
///
/// # Example
///
/// ```
/// use psoc6_flash::FlashProgress;
///
/// let progress = FlashProgress::new(|event| println!("Event: {:?}", event));
/// ```
pub struct FlashProgress {
    handler: Box<dyn Fn(ProgressEvent)>,
}

impl FlashProgress {
    /// Create a new `FlashProgress` with a given `handler` to be called on events.
    pub fn new(handler: impl Fn(ProgressEvent) + 'static) -> Self {
        Self {
            handler: Box::new(handler),
        }
    }

    /// A progress handler that discards all events.
    pub fn no_op() -> Self {
        Self::new(|_| {})
    }

    pub(crate) fn emit(&self, event: ProgressEvent) {
        (self.handler)(event);
    }
}

impl Default for FlashProgress {
    fn default() -> Self {
        Self::no_op()
    }
}

/// Possible events during erasing and programming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The erase procedure started.
    StartedErasing,
    /// One erase step completed; `address` is the next unerased address,
    /// `end` the (row-aligned) end of the requested range.
    Erased {
        /// Next address still to be erased.
        address: u32,
        /// Row-aligned end of the erase range.
        end: u32,
    },
    /// The erase procedure completed successfully.
    FinishedErasing,
    /// The programming procedure started.
    StartedProgramming,
    /// One flash row has been programmed.
    RowProgrammed {
        /// Zero-based index of the row just written.
        row: u32,
        /// Total number of rows in the image.
        total_rows: u32,
    },
    /// The programming procedure completed successfully.
    FinishedProgramming,
}
