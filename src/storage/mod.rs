// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Offline package storage
//
// The manifest store keeps the full package list in memory and commits it
// as one JSON document through a ManifestBackend. Backends only know how
// to read and atomically replace that document.

pub mod backend;
pub mod factory;
pub mod filesystem;
pub mod manifest;
pub mod memory;

pub use backend::ManifestBackend;
pub use factory::BackendFactory;
pub use filesystem::FilesystemBackend;
pub use manifest::OfflineManifestStore;
pub use memory::MemoryBackend;
