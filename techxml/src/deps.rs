pub use arcstr;
