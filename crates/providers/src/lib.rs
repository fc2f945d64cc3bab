pub mod mathmex;
