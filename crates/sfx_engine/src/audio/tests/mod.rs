//! End-to-end sound-effect scenarios against the headless backend
