// Copyright 2015-2018 Aerospike, Inc.
//
// Portions may be licensed to Aerospike, Inc. under one or more contributor
// license agreements.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy of
// the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations under
// the License.

// FieldType signifies the request field tags. The values align with the
// server-side file proto.h.

#[derive(Debug, Clone, Copy)]
pub enum FieldType {
    Namespace = 0,
    Set = 1,
    Key = 2,
    // Bin = 3,
    DigestRipe = 4,
    // GUID = 5,
    // DigestRipeArray = 6,
}
