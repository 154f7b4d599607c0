pub mod google_recognizer;
